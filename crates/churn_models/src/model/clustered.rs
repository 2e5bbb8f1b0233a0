//! Population split into clusters, each with its own transition matrix.

use churn_core::matrix::{TransitionMatrix, DEFAULT_ROW_SUM_TOLERANCE};
use churn_core::types::ValidationError;

use crate::rng::ChainRng;

/// One customer segment with its own dynamics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Segment name.
    pub name: String,
    /// Share of the population in this segment.
    pub probability: f64,
    /// Transition matrix of the segment.
    pub matrix: TransitionMatrix,
}

impl Cluster {
    /// Creates a cluster.
    pub fn new(name: impl Into<String>, probability: f64, matrix: TransitionMatrix) -> Self {
        Self {
            name: name.into(),
            probability,
            matrix,
        }
    }
}

/// Mixture of per-cluster transition matrices.
///
/// Aggregate populations advance through the probability-weighted mixture
/// matrix (cached at construction). Individual entities belong to exactly
/// one cluster, drawn from the cluster probabilities.
///
/// # Examples
///
/// ```
/// use churn_core::matrix::TransitionMatrix;
/// use churn_models::model::{Cluster, ClusteredModel};
///
/// let loyal = TransitionMatrix::new(vec![vec![0.95, 0.05], vec![0.0, 1.0]], ["Active", "Churned"]).unwrap();
/// let fickle = TransitionMatrix::new(vec![vec![0.55, 0.45], vec![0.0, 1.0]], ["Active", "Churned"]).unwrap();
///
/// let model = ClusteredModel::new(vec![
///     Cluster::new("loyal", 0.5, loyal),
///     Cluster::new("fickle", 0.5, fickle),
/// ])
/// .unwrap();
///
/// assert!((model.effective().rows()[0][1] - 0.25).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredModel {
    clusters: Vec<Cluster>,
    effective: TransitionMatrix,
}

impl ClusteredModel {
    /// Builds a clustered model.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` for an empty cluster list
    /// - `InvalidParameter` for duplicate names, negative or non-finite
    ///   probabilities, probabilities not summing to one, or matrices over
    ///   different state sets
    pub fn new(clusters: Vec<Cluster>) -> Result<Self, ValidationError> {
        if clusters.is_empty() {
            return Err(ValidationError::DimensionMismatch {
                what: "clusters",
                expected: 1,
                got: 0,
            });
        }

        for (i, c) in clusters.iter().enumerate() {
            if !c.probability.is_finite() || c.probability < 0.0 {
                return Err(ValidationError::InvalidParameter {
                    name: "cluster_probabilities",
                    value: format!("cluster '{}' has probability {}", c.name, c.probability),
                });
            }
            if clusters[..i].iter().any(|other| other.name == c.name) {
                return Err(ValidationError::InvalidParameter {
                    name: "clusters",
                    value: format!("duplicate cluster '{}'", c.name),
                });
            }
        }

        let sum: f64 = clusters.iter().map(|c| c.probability).sum();
        if (sum - 1.0).abs() > DEFAULT_ROW_SUM_TOLERANCE {
            return Err(ValidationError::InvalidParameter {
                name: "cluster_probabilities",
                value: format!("sum to {sum}, expected 1.0"),
            });
        }

        let weights: Vec<f64> = clusters.iter().map(|c| c.probability).collect();
        let matrices: Vec<&TransitionMatrix> = clusters.iter().map(|c| &c.matrix).collect();
        let effective = TransitionMatrix::mixture(&weights, &matrices)?;

        Ok(Self {
            clusters,
            effective,
        })
    }

    /// Clusters in construction order.
    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Probability-weighted mixture of the cluster matrices.
    #[inline]
    pub fn effective(&self) -> &TransitionMatrix {
        &self.effective
    }

    /// Draws the cluster a new entity belongs to.
    pub fn draw_cluster(&self, rng: &mut ChainRng) -> &Cluster {
        let weights: Vec<f64> = self.clusters.iter().map(|c| c.probability).collect();
        &self.clusters[rng.categorical(&weights)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(churn: f64) -> TransitionMatrix {
        TransitionMatrix::new(
            vec![vec![1.0 - churn, churn], vec![0.0, 1.0]],
            ["Active", "Churned"],
        )
        .unwrap()
    }

    #[test]
    fn test_clustered_effective_matrix() {
        let model = ClusteredModel::new(vec![
            Cluster::new("a", 0.25, matrix(0.4)),
            Cluster::new("b", 0.75, matrix(0.0)),
        ])
        .unwrap();
        assert!((model.effective().rows()[0][1] - 0.1).abs() < 1e-12);
        assert!(model.effective().is_absorbing(1));
        assert_eq!(model.clusters().len(), 2);
    }

    #[test]
    fn test_clustered_rejects_bad_probabilities() {
        let err = ClusteredModel::new(vec![
            Cluster::new("a", 0.5, matrix(0.1)),
            Cluster::new("b", 0.4, matrix(0.1)),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidParameter {
                name: "cluster_probabilities",
                ..
            }
        ));

        assert!(ClusteredModel::new(vec![Cluster::new("a", -1.0, matrix(0.1))]).is_err());
        assert!(ClusteredModel::new(Vec::new()).is_err());
    }

    #[test]
    fn test_clustered_rejects_duplicate_names() {
        let err = ClusteredModel::new(vec![
            Cluster::new("a", 0.5, matrix(0.1)),
            Cluster::new("a", 0.5, matrix(0.2)),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParameter { name: "clusters", .. }));
    }

    #[test]
    fn test_draw_cluster_follows_probabilities() {
        let model = ClusteredModel::new(vec![
            Cluster::new("never", 0.0, matrix(0.1)),
            Cluster::new("always", 1.0, matrix(0.2)),
        ])
        .unwrap();
        let mut rng = ChainRng::from_seed(8);
        for _ in 0..50 {
            assert_eq!(model.draw_cluster(&mut rng).name, "always");
        }
    }
}
