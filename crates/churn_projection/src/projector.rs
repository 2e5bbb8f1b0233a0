//! Aggregate population projection engine.
//!
//! The [`PopulationProjector`] coordinates:
//! 1. Random number generation (via [`ChainRng`])
//! 2. One-step redistribution (via [`TransitionModel::advance`])
//! 3. Truncation back to whole counts
//! 4. Inflow of new entities (via [`InflowSampler`])
//!
//! Two variants share the step loop. [`PopulationProjector::project`] treats
//! every state alike; [`PopulationProjector::project_absorbing`] turns one
//! state into a sink whose column accumulates everything that has ever
//! reached it and which receives no inflow.

use churn_core::counts::{add_count, add_counts, floor_counts, to_mass, total};
use churn_core::types::{ChainError, ValidationError};
use churn_models::inflow::{with_sink_slot, InflowRequest, InflowSampler, QuotaBase};
use churn_models::model::{TransitionModel, TransitionModelEnum};
use churn_models::rng::ChainRng;
use tracing::{debug, info, warn};

use crate::config::ProjectionConfig;
use crate::table::ProjectionTable;

/// Projection variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProjectionKind {
    /// Every state transitions and receives inflow.
    Plain,
    /// The configured absorbing state is a cumulative sink.
    #[default]
    Absorbing,
}

/// Population projector.
///
/// Owns the transition model, the configuration and a seeded RNG. Repeated
/// calls continue the same random stream; build a new projector (or use
/// [`PopulationProjector::reseed`]) to replay a run.
///
/// # Examples
///
/// ```rust
/// use churn_core::matrix::TransitionMatrix;
/// use churn_models::inflow::InflowSampler;
/// use churn_projection::config::ProjectionConfig;
/// use churn_projection::projector::PopulationProjector;
///
/// let matrix = TransitionMatrix::new(
///     vec![vec![0.8, 0.2], vec![0.0, 1.0]],
///     ["Active", "Churned"],
/// )
/// .unwrap();
/// let config = ProjectionConfig::builder().step_nr(3).build().unwrap();
///
/// let mut projector = PopulationProjector::new(matrix, config);
/// let table = projector
///     .project_absorbing(&[1000, 0], &InflowSampler::none())
///     .unwrap();
///
/// assert_eq!(table.rows(), &[vec![1000u64, 0], vec![800, 200], vec![640, 360]]);
/// ```
#[derive(Clone, Debug)]
pub struct PopulationProjector {
    model: TransitionModelEnum,
    config: ProjectionConfig,
    rng: ChainRng,
}

impl PopulationProjector {
    /// Creates a projector seeded from the configuration (seed 0 if unset).
    pub fn new(model: impl Into<TransitionModelEnum>, config: ProjectionConfig) -> Self {
        let rng = ChainRng::from_seed(config.seed().unwrap_or(0));
        Self::with_rng(model, config, rng)
    }

    /// Creates a projector drawing from an injected RNG.
    pub fn with_rng(
        model: impl Into<TransitionModelEnum>,
        config: ProjectionConfig,
        rng: ChainRng,
    ) -> Self {
        Self {
            model: model.into(),
            config,
            rng,
        }
    }

    /// Returns the transition model.
    #[inline]
    pub fn model(&self) -> &TransitionModelEnum {
        &self.model
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Resets the RNG to `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChainRng::from_seed(seed);
    }

    /// Runs the projection variant selected by `kind`.
    pub fn run(
        &mut self,
        kind: ProjectionKind,
        initial: &[u64],
        inflow: &InflowSampler,
    ) -> Result<ProjectionTable, ChainError> {
        match kind {
            ProjectionKind::Plain => self.project(initial, inflow),
            ProjectionKind::Absorbing => self.project_absorbing(initial, inflow),
        }
    }

    /// Projects without an absorbing state.
    ///
    /// # Errors
    ///
    /// - `ValidationError::InvalidStepCount` for an out-of-range `step_nr`
    /// - `ValidationError::DimensionMismatch` if `initial` has the wrong length
    /// - inflow sampler errors, unchanged
    pub fn project(
        &mut self,
        initial: &[u64],
        inflow: &InflowSampler,
    ) -> Result<ProjectionTable, ChainError> {
        self.simulate(initial, inflow, None)
    }

    /// Projects with the configured absorbing state as a cumulative sink.
    ///
    /// # Errors
    ///
    /// As [`PopulationProjector::project`], plus `LookupError::UnknownState`
    /// if the configured absorbing label is not a state.
    pub fn project_absorbing(
        &mut self,
        initial: &[u64],
        inflow: &InflowSampler,
    ) -> Result<ProjectionTable, ChainError> {
        let sink = self.config.absorbing_state().resolve(self.model.states())?;
        if !self.model.is_absorbing(sink) {
            warn!(
                state = self.model.states().label_of(sink).unwrap_or_default(),
                "absorbing state row is not absorbing; its outflow is ignored"
            );
        }
        self.simulate(initial, inflow, Some(sink))
    }

    fn simulate(
        &mut self,
        initial: &[u64],
        inflow: &InflowSampler,
        sink: Option<usize>,
    ) -> Result<ProjectionTable, ChainError> {
        self.config.validate()?;
        let n = self.model.dim();
        if initial.len() != n {
            return Err(ValidationError::DimensionMismatch {
                what: "initial population",
                expected: n,
                got: initial.len(),
            }
            .into());
        }

        let step_nr = self.config.step_nr();
        let open_states = if sink.is_some() { n - 1 } else { n };
        let initial_total = total(initial)?;

        info!(
            model = self.model.model_name(),
            inflow = inflow.mode_name(),
            absorbing = sink.is_some(),
            step_nr,
            initial_total,
            "starting projection"
        );

        let mut rows = Vec::with_capacity(step_nr);
        rows.push(initial.to_vec());

        let mut present = initial.to_vec();
        let mut absorbed = sink.map_or(0, |s| initial[s]);

        for step in 1..step_nr {
            if let Some(s) = sink {
                present[s] = 0;
            }
            let mut current = floor_counts(&self.model.advance(&to_mass(&present))?)?;
            if let Some(s) = sink {
                absorbed = add_count(absorbed, current[s])?;
                current[s] = 0;
            }

            let base_total = match self.config.quota_base() {
                QuotaBase::Initial => initial_total,
                QuotaBase::Current => total(&current)?,
            };
            let request = InflowRequest {
                step,
                base_total,
                open_states,
            };
            let arrivals = with_sink_slot(&inflow.sample(request, &mut self.rng)?, sink);
            add_counts(&mut current, &arrivals)?;

            let mut row = current.clone();
            if let Some(s) = sink {
                row[s] = absorbed;
            }
            let row_total = total(&row)?;
            debug!(step, total = row_total, absorbed, "projected step");
            rows.push(row);
            present = current;
        }

        let states = self.model.states().labels().to_vec();
        let table = ProjectionTable::from_rows(states, rows)?;
        info!(
            rows = table.n_steps(),
            final_total = table.last().and_then(|r| total(r).ok()).unwrap_or(0),
            "projection complete"
        );
        Ok(table)
    }
}
