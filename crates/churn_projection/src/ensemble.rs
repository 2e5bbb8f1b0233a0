//! Parallel projection ensembles.
//!
//! A single projection is one draw of the inflow process. [`ProjectionEnsemble`]
//! repeats it `n_runs` times with consecutive seeds using Rayon and reduces the
//! tables to per-cell mean, min and max.

use std::time::Instant;

use churn_core::types::{ChainError, LookupError, ValidationError};
use churn_models::inflow::InflowSampler;
use churn_models::model::{TransitionModel, TransitionModelEnum};
use churn_models::rng::ChainRng;
use rayon::prelude::*;
use tracing::info;

use crate::config::ProjectionConfig;
use crate::projector::{PopulationProjector, ProjectionKind};
use crate::table::ProjectionTable;

/// Upper bound on ensemble size.
pub const MAX_RUNS: usize = 100_000;

/// Cell-wise statistics over an ensemble of projection tables.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnsembleSummary {
    states: Vec<String>,
    n_runs: usize,
    mean: Vec<Vec<f64>>,
    min: Vec<Vec<u64>>,
    max: Vec<Vec<u64>>,
}

impl EnsembleSummary {
    fn from_tables(tables: &[ProjectionTable]) -> Option<Self> {
        let first = tables.first()?;
        let n_runs = tables.len();
        let mut mean = vec![vec![0.0; first.n_states()]; first.n_steps()];
        let mut min = first.rows().to_vec();
        let mut max = first.rows().to_vec();

        for table in tables {
            for (t, row) in table.rows().iter().enumerate() {
                for (j, &count) in row.iter().enumerate() {
                    mean[t][j] += count as f64;
                    min[t][j] = min[t][j].min(count);
                    max[t][j] = max[t][j].max(count);
                }
            }
        }
        for row in &mut mean {
            for cell in row.iter_mut() {
                *cell /= n_runs as f64;
            }
        }

        Some(Self {
            states: first.states().to_vec(),
            n_runs,
            mean,
            min,
            max,
        })
    }

    /// Number of runs reduced.
    #[inline]
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Column labels.
    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Per-cell mean counts.
    #[inline]
    pub fn mean(&self) -> &[Vec<f64>] {
        &self.mean
    }

    /// Per-cell minimum counts.
    #[inline]
    pub fn min(&self) -> &[Vec<u64>] {
        &self.min
    }

    /// Per-cell maximum counts.
    #[inline]
    pub fn max(&self) -> &[Vec<u64>] {
        &self.max
    }

    /// Mean counts of one state across steps.
    pub fn mean_column(&self, label: &str) -> Result<Vec<f64>, LookupError> {
        let index = self
            .states
            .iter()
            .position(|s| s == label)
            .ok_or_else(|| LookupError::UnknownState {
                label: label.to_string(),
            })?;
        Ok(self.mean.iter().map(|r| r[index]).collect())
    }
}

/// Runs independent seeded projections in parallel.
///
/// Run `i` uses seed `base + i`, where `base` is the configured seed
/// (0 if unset), so an ensemble is reproducible regardless of thread count.
///
/// # Examples
///
/// ```rust
/// use churn_core::matrix::TransitionMatrix;
/// use churn_models::inflow::{InflowSampler, QuotaInflow};
/// use churn_projection::config::ProjectionConfig;
/// use churn_projection::ensemble::ProjectionEnsemble;
/// use churn_projection::projector::ProjectionKind;
///
/// let matrix = TransitionMatrix::new(
///     vec![vec![0.6, 0.3, 0.1], vec![0.2, 0.7, 0.1], vec![0.0, 0.0, 1.0]],
///     ["Trial", "Paid", "Churned"],
/// )
/// .unwrap();
/// let config = ProjectionConfig::builder().step_nr(6).seed(1).build().unwrap();
/// let ensemble = ProjectionEnsemble::new(matrix, config, 8).unwrap();
///
/// let inflow = InflowSampler::from(QuotaInflow::new(0.05).unwrap());
/// let summary = ensemble
///     .run(ProjectionKind::Absorbing, &[400, 600, 0], &inflow)
///     .unwrap();
///
/// assert_eq!(summary.n_runs(), 8);
/// assert_eq!(summary.mean()[0], vec![400.0, 600.0, 0.0]);
/// ```
#[derive(Clone, Debug)]
pub struct ProjectionEnsemble {
    model: TransitionModelEnum,
    config: ProjectionConfig,
    n_runs: usize,
}

impl ProjectionEnsemble {
    /// Creates an ensemble of `n_runs` projections.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `n_runs` is 0 or exceeds [`MAX_RUNS`].
    pub fn new(
        model: impl Into<TransitionModelEnum>,
        config: ProjectionConfig,
        n_runs: usize,
    ) -> Result<Self, ValidationError> {
        if n_runs == 0 || n_runs > MAX_RUNS {
            return Err(ValidationError::InvalidParameter {
                name: "n_runs",
                value: format!("{n_runs} must be in [1, {MAX_RUNS}]"),
            });
        }
        Ok(Self {
            model: model.into(),
            config,
            n_runs,
        })
    }

    /// Number of runs.
    #[inline]
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Runs every projection and reduces the tables.
    ///
    /// # Errors
    ///
    /// The first error raised by any run; no partial summary is returned.
    pub fn run(
        &self,
        kind: ProjectionKind,
        initial: &[u64],
        inflow: &InflowSampler,
    ) -> Result<EnsembleSummary, ChainError> {
        let base_seed = self.config.seed().unwrap_or(0);
        let start = Instant::now();

        let tables = (0..self.n_runs)
            .into_par_iter()
            .map(|i| {
                let rng = ChainRng::from_seed(base_seed.wrapping_add(i as u64));
                let mut projector =
                    PopulationProjector::with_rng(self.model.clone(), self.config.clone(), rng);
                projector.run(kind, initial, inflow)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            model = self.model.model_name(),
            n_runs = self.n_runs,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ensemble complete"
        );

        EnsembleSummary::from_tables(&tables).ok_or_else(|| {
            ValidationError::InvalidParameter {
                name: "n_runs",
                value: "ensemble produced no tables".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use churn_core::matrix::TransitionMatrix;
    use churn_models::inflow::QuotaInflow;

    fn matrix() -> TransitionMatrix {
        TransitionMatrix::new(
            vec![vec![0.9, 0.1], vec![0.0, 1.0]],
            ["Active", "Churned"],
        )
        .unwrap()
    }

    fn config() -> ProjectionConfig {
        ProjectionConfig::builder().step_nr(5).seed(3).build().unwrap()
    }

    #[test]
    fn test_run_bounds() {
        assert!(ProjectionEnsemble::new(matrix(), config(), 0).is_err());
        assert!(ProjectionEnsemble::new(matrix(), config(), MAX_RUNS + 1).is_err());
        assert_eq!(
            ProjectionEnsemble::new(matrix(), config(), 4)
                .unwrap()
                .n_runs(),
            4
        );
    }

    #[test]
    fn test_deterministic_ensemble_collapses() {
        let ensemble = ProjectionEnsemble::new(matrix(), config(), 16).unwrap();
        let summary = ensemble
            .run(ProjectionKind::Absorbing, &[100, 0], &InflowSampler::none())
            .unwrap();

        assert_eq!(summary.min(), summary.max());
        let churned = summary.mean_column("Churned").unwrap();
        for (got, want) in churned.iter().zip([0.0, 10.0, 19.0, 27.0, 34.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_min_mean_max_ordering() {
        let three = TransitionMatrix::new(
            vec![vec![0.5, 0.4, 0.1], vec![0.3, 0.6, 0.1], vec![0.0, 0.0, 1.0]],
            ["A", "B", "C"],
        )
        .unwrap();
        let ensemble = ProjectionEnsemble::new(three, config(), 32).unwrap();
        let inflow = InflowSampler::from(QuotaInflow::new(0.2).unwrap());
        let summary = ensemble
            .run(ProjectionKind::Absorbing, &[300, 300, 0], &inflow)
            .unwrap();

        for t in 0..5 {
            for j in 0..3 {
                let (lo, hi) = (summary.min()[t][j] as f64, summary.max()[t][j] as f64);
                assert!(lo <= summary.mean()[t][j] + 1e-9);
                assert!(summary.mean()[t][j] <= hi + 1e-9);
            }
        }
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let ensemble = ProjectionEnsemble::new(matrix(), config(), 8).unwrap();
        let inflow = InflowSampler::from(QuotaInflow::new(0.1).unwrap());
        let a = ensemble
            .run(ProjectionKind::Plain, &[100, 0], &inflow)
            .unwrap();
        let b = ensemble
            .run(ProjectionKind::Plain, &[100, 0], &inflow)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_aborts_ensemble() {
        let ensemble = ProjectionEnsemble::new(matrix(), config(), 4).unwrap();
        let err = ensemble
            .run(ProjectionKind::Plain, &[1, 2, 3], &InflowSampler::none())
            .unwrap_err();
        assert!(err.is_validation());
    }
}
