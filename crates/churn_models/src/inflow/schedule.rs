//! Scheduled-mode inflow: hourly arrival counts split by first-touch state.

use std::collections::BTreeMap;

use churn_core::counts::floor_count;
use churn_core::matrix::DEFAULT_ROW_SUM_TOLERANCE;
use churn_core::types::{ChainError, LookupError, ValidationError};

use crate::rng::ChainRng;

/// Steps per schedule bucket (steps are minutes, buckets are hours).
pub const STEPS_PER_BUCKET: usize = 60;

/// Bucket addressed by the first hour of the run.
pub const FIRST_BUCKET: u32 = 7;

/// Hour bucket → raw arrivals during that hour.
///
/// # Examples
///
/// ```
/// use churn_models::inflow::InflowSchedule;
///
/// let schedule = InflowSchedule::new([(7, 600.0), (8, 1200.0)]).unwrap();
/// assert_eq!(schedule.bucket_for_step(59), 7);
/// assert_eq!(schedule.bucket_for_step(60), 8);
/// assert_eq!(schedule.arrivals_for_step(1).unwrap(), 10);
/// assert_eq!(schedule.arrivals_for_step(61).unwrap(), 20);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InflowSchedule {
    buckets: BTreeMap<u32, f64>,
}

impl InflowSchedule {
    /// Builds a schedule from `(bucket, arrivals)` pairs.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for negative or non-finite arrival counts.
    pub fn new<I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut buckets = BTreeMap::new();
        for (bucket, arrivals) in entries {
            if !arrivals.is_finite() || arrivals < 0.0 {
                return Err(ValidationError::InvalidParameter {
                    name: "schedule",
                    value: format!("bucket {bucket} has arrivals {arrivals}"),
                });
            }
            buckets.insert(bucket, arrivals);
        }
        Ok(Self { buckets })
    }

    /// Hour bucket addressed by `step`: `floor(step / 60) + 7`.
    #[inline]
    pub fn bucket_for_step(&self, step: usize) -> u32 {
        (step / STEPS_PER_BUCKET) as u32 + FIRST_BUCKET
    }

    /// Whole arrivals per step within `step`'s bucket (hourly count / 60,
    /// truncated).
    ///
    /// # Errors
    ///
    /// `LookupError::MissingBucket` if the bucket has no entry.
    pub fn arrivals_for_step(&self, step: usize) -> Result<u64, LookupError> {
        let bucket = self.bucket_for_step(step);
        let hourly = self
            .buckets
            .get(&bucket)
            .ok_or(LookupError::MissingBucket { step, bucket })?;
        Ok(floor_count(hourly / STEPS_PER_BUCKET as f64))
    }

    /// Number of buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the schedule has no buckets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Scheduled-mode inflow sampler.
///
/// Per-step arrivals come from the [`InflowSchedule`]; the split across open
/// states is a multinomial draw over the first-touch probabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledInflow {
    schedule: InflowSchedule,
    first_touch: Vec<f64>,
}

impl ScheduledInflow {
    /// Creates a scheduled sampler.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `first_touch` is empty, has a negative or
    /// non-finite entry, or does not sum to one.
    pub fn new(schedule: InflowSchedule, first_touch: Vec<f64>) -> Result<Self, ValidationError> {
        let invalid = |value: String| ValidationError::InvalidParameter {
            name: "first_touch",
            value,
        };
        if first_touch.is_empty() {
            return Err(invalid("must not be empty".to_string()));
        }
        if let Some(p) = first_touch.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(invalid(format!("probability {p} is not valid")));
        }
        let sum: f64 = first_touch.iter().sum();
        if (sum - 1.0).abs() > DEFAULT_ROW_SUM_TOLERANCE {
            return Err(invalid(format!("sums to {sum}, expected 1.0")));
        }
        Ok(Self {
            schedule,
            first_touch,
        })
    }

    /// The arrival schedule.
    #[inline]
    pub fn schedule(&self) -> &InflowSchedule {
        &self.schedule
    }

    /// First-touch probabilities over the open states.
    #[inline]
    pub fn first_touch(&self) -> &[f64] {
        &self.first_touch
    }

    /// Draws the inflow split for `step` across `open_states` states.
    ///
    /// # Errors
    ///
    /// - `LookupError::MissingBucket` if the step's bucket is absent
    /// - `ValidationError::DimensionMismatch` if the first-touch vector does
    ///   not cover exactly `open_states` states
    pub fn sample(
        &self,
        step: usize,
        open_states: usize,
        rng: &mut ChainRng,
    ) -> Result<Vec<u64>, ChainError> {
        if self.first_touch.len() != open_states {
            return Err(ValidationError::DimensionMismatch {
                what: "first-touch probabilities",
                expected: open_states,
                got: self.first_touch.len(),
            }
            .into());
        }
        let arrivals = self.schedule.arrivals_for_step(step)?;
        Ok(rng.multinomial(arrivals, &self.first_touch)?)
    }
}
