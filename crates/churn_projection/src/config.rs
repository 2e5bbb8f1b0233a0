//! Projection configuration.
//!
//! This module provides configuration types and builders for population
//! projections.

use churn_core::types::{LookupError, StateSet, ValidationError};
use churn_core::MAX_STEPS;
use churn_models::inflow::QuotaBase;

/// Which state acts as the absorbing sink in checkout-style projections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AbsorbingState {
    /// The last state of the state set.
    #[default]
    Last,
    /// A state chosen by label.
    Named(String),
}

impl AbsorbingState {
    /// Resolves the sink index against a state set.
    ///
    /// # Errors
    ///
    /// `LookupError::UnknownState` for a label not in `states`.
    pub fn resolve(&self, states: &StateSet) -> Result<usize, LookupError> {
        match self {
            AbsorbingState::Last => Ok(states.len() - 1),
            AbsorbingState::Named(label) => states.index_of(label),
        }
    }
}

/// Population projection configuration.
///
/// Immutable configuration specifying projection parameters.
/// Use [`ProjectionConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use churn_projection::config::ProjectionConfig;
///
/// let config = ProjectionConfig::builder()
///     .step_nr(12)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.step_nr(), 12);
/// assert_eq!(config.seed(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionConfig {
    /// Number of table rows, including the initial row.
    step_nr: usize,
    /// Optional seed for reproducibility.
    seed: Option<u64>,
    /// Population total the inflow quota applies to.
    quota_base: QuotaBase,
    /// Sink state for absorbing projections.
    absorbing_state: AbsorbingState,
}

impl ProjectionConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> ProjectionConfigBuilder {
        ProjectionConfigBuilder::default()
    }

    /// Returns the number of rows in the projected table.
    #[inline]
    pub fn step_nr(&self) -> usize {
        self.step_nr
    }

    /// Returns the optional seed for reproducibility.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the quota base.
    #[inline]
    pub fn quota_base(&self) -> QuotaBase {
        self.quota_base
    }

    /// Returns the absorbing-state selection.
    #[inline]
    pub fn absorbing_state(&self) -> &AbsorbingState {
        &self.absorbing_state
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidStepCount` if `step_nr` is 0 or
    /// greater than [`MAX_STEPS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step_nr == 0 || self.step_nr > MAX_STEPS {
            return Err(ValidationError::InvalidStepCount(self.step_nr));
        }
        Ok(())
    }
}

/// Builder for [`ProjectionConfig`].
#[derive(Clone, Debug, Default)]
pub struct ProjectionConfigBuilder {
    step_nr: Option<usize>,
    seed: Option<u64>,
    quota_base: QuotaBase,
    absorbing_state: AbsorbingState,
}

impl ProjectionConfigBuilder {
    /// Sets the number of table rows (`step_nr` in [1, 100_000]).
    #[inline]
    pub fn step_nr(mut self, step_nr: usize) -> Self {
        self.step_nr = Some(step_nr);
        self
    }

    /// Sets the seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the quota base.
    #[inline]
    pub fn quota_base(mut self, quota_base: QuotaBase) -> Self {
        self.quota_base = quota_base;
        self
    }

    /// Selects the absorbing state by label.
    #[inline]
    pub fn absorbing_state(mut self, label: impl Into<String>) -> Self {
        self.absorbing_state = AbsorbingState::Named(label.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `step_nr` is not set or out of range.
    pub fn build(self) -> Result<ProjectionConfig, ValidationError> {
        let step_nr = self.step_nr.ok_or(ValidationError::InvalidParameter {
            name: "step_nr",
            value: "must be specified".to_string(),
        })?;

        let config = ProjectionConfig {
            step_nr,
            seed: self.seed,
            quota_base: self.quota_base,
            absorbing_state: self.absorbing_state,
        };

        config.validate()?;
        Ok(config)
    }
}
