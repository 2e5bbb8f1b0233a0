//! Transition models.
//!
//! [`TransitionModel`] is the capability interface the projector and the
//! trajectory sampler program against. [`TransitionModelEnum`] is the static
//! dispatch enum over the two supported variants, chosen once at
//! construction:
//!
//! - `Homogeneous`: one matrix for the whole population
//! - `Clustered`: per-cluster matrices mixed by cluster probability
//!
//! ```
//! use churn_core::matrix::TransitionMatrix;
//! use churn_models::model::{TransitionModel, TransitionModelEnum};
//!
//! let m = TransitionMatrix::new(vec![vec![0.8, 0.2], vec![0.0, 1.0]], ["Active", "Churned"]).unwrap();
//! let model = TransitionModelEnum::homogeneous(m);
//!
//! assert_eq!(model.model_name(), "Homogeneous");
//! let next = model.advance(&[1000.0, 0.0]).unwrap();
//! assert!((next[1] - 200.0).abs() < 1e-9);
//! ```

mod clustered;

pub use clustered::{Cluster, ClusteredModel};

use churn_core::matrix::TransitionMatrix;
use churn_core::types::{StateSet, ValidationError};

use crate::rng::ChainRng;

/// Capability interface for Markov transition dynamics over a state set.
pub trait TransitionModel {
    /// The state set indexing populations.
    fn states(&self) -> &StateSet;

    /// Number of states.
    fn dim(&self) -> usize {
        self.states().len()
    }

    /// Redistributes aggregate `mass` over one step (row vector × matrix).
    fn advance(&self, mass: &[f64]) -> Result<Vec<f64>, ValidationError>;

    /// Whether state `index` keeps all of its aggregate mass.
    fn is_absorbing(&self, index: usize) -> bool;

    /// Matrix followed by one newly drawn entity for its whole trajectory.
    fn entity_matrix(&self, rng: &mut ChainRng) -> &TransitionMatrix;

    /// Short model name for logging.
    fn model_name(&self) -> &'static str;
}

impl TransitionModel for TransitionMatrix {
    fn states(&self) -> &StateSet {
        TransitionMatrix::states(self)
    }

    fn advance(&self, mass: &[f64]) -> Result<Vec<f64>, ValidationError> {
        self.apply(mass)
    }

    fn is_absorbing(&self, index: usize) -> bool {
        TransitionMatrix::is_absorbing(self, index)
    }

    fn entity_matrix(&self, _rng: &mut ChainRng) -> &TransitionMatrix {
        self
    }

    fn model_name(&self) -> &'static str {
        "Homogeneous"
    }
}

impl TransitionModel for ClusteredModel {
    fn states(&self) -> &StateSet {
        self.effective().states()
    }

    fn advance(&self, mass: &[f64]) -> Result<Vec<f64>, ValidationError> {
        self.effective().apply(mass)
    }

    fn is_absorbing(&self, index: usize) -> bool {
        self.effective().is_absorbing(index)
    }

    fn entity_matrix(&self, rng: &mut ChainRng) -> &TransitionMatrix {
        &self.draw_cluster(rng).matrix
    }

    fn model_name(&self) -> &'static str {
        "Clustered"
    }
}

/// Static dispatch enum for transition models.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionModelEnum {
    /// One matrix for every entity.
    Homogeneous(TransitionMatrix),
    /// Cluster probabilities with one matrix per cluster.
    Clustered(ClusteredModel),
}

impl TransitionModelEnum {
    /// Wraps a single matrix.
    #[inline]
    pub fn homogeneous(matrix: TransitionMatrix) -> Self {
        TransitionModelEnum::Homogeneous(matrix)
    }

    /// Builds a clustered model.
    pub fn clustered(clusters: Vec<Cluster>) -> Result<Self, ValidationError> {
        Ok(TransitionModelEnum::Clustered(ClusteredModel::new(clusters)?))
    }

    /// Matrix driving aggregate projections.
    pub fn aggregate_matrix(&self) -> &TransitionMatrix {
        match self {
            TransitionModelEnum::Homogeneous(m) => m,
            TransitionModelEnum::Clustered(c) => c.effective(),
        }
    }
}

impl From<TransitionMatrix> for TransitionModelEnum {
    fn from(matrix: TransitionMatrix) -> Self {
        TransitionModelEnum::Homogeneous(matrix)
    }
}

impl From<ClusteredModel> for TransitionModelEnum {
    fn from(model: ClusteredModel) -> Self {
        TransitionModelEnum::Clustered(model)
    }
}

impl TransitionModel for TransitionModelEnum {
    fn states(&self) -> &StateSet {
        match self {
            TransitionModelEnum::Homogeneous(m) => TransitionModel::states(m),
            TransitionModelEnum::Clustered(c) => TransitionModel::states(c),
        }
    }

    fn advance(&self, mass: &[f64]) -> Result<Vec<f64>, ValidationError> {
        match self {
            TransitionModelEnum::Homogeneous(m) => m.advance(mass),
            TransitionModelEnum::Clustered(c) => c.advance(mass),
        }
    }

    fn is_absorbing(&self, index: usize) -> bool {
        match self {
            TransitionModelEnum::Homogeneous(m) => TransitionModel::is_absorbing(m, index),
            TransitionModelEnum::Clustered(c) => TransitionModel::is_absorbing(c, index),
        }
    }

    fn entity_matrix(&self, rng: &mut ChainRng) -> &TransitionMatrix {
        match self {
            TransitionModelEnum::Homogeneous(m) => m.entity_matrix(rng),
            TransitionModelEnum::Clustered(c) => c.entity_matrix(rng),
        }
    }

    fn model_name(&self) -> &'static str {
        match self {
            TransitionModelEnum::Homogeneous(m) => m.model_name(),
            TransitionModelEnum::Clustered(c) => c.model_name(),
        }
    }
}
