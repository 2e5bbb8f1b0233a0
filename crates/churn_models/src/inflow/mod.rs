//! Inflow of new entities per projection step.
//!
//! Two policies, selected once by configuration:
//!
//! - [`QuotaInflow`]: `floor(T·q)` newcomers split by a uniform Dirichlet draw
//! - [`ScheduledInflow`]: hourly arrivals from an [`InflowSchedule`] split by a
//!   multinomial draw over first-touch probabilities
//!
//! Samplers produce one count per *open* (non-absorbing) state;
//! [`with_sink_slot`] places the explicit zero for an absorbing column.

mod quota;
mod schedule;

pub use quota::{QuotaBase, QuotaInflow, QuotaRounding};
pub use schedule::{InflowSchedule, ScheduledInflow, FIRST_BUCKET, STEPS_PER_BUCKET};

use churn_core::types::ChainError;

use crate::rng::ChainRng;

/// Inputs a sampler may need at one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InflowRequest {
    /// Step counter, starting at 1 for the first projected step.
    pub step: usize,
    /// Population total the quota applies to.
    pub base_total: u64,
    /// Number of states that receive inflow.
    pub open_states: usize,
}

/// Inflow policy.
///
/// # Examples
///
/// ```
/// use churn_models::inflow::{InflowRequest, InflowSampler};
/// use churn_models::rng::ChainRng;
///
/// let sampler = InflowSampler::none();
/// let mut rng = ChainRng::from_seed(0);
/// let request = InflowRequest { step: 1, base_total: 1000, open_states: 2 };
/// assert_eq!(sampler.sample(request, &mut rng).unwrap(), vec![0, 0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum InflowSampler {
    /// Fixed relative quota of a base population.
    Quota(QuotaInflow),
    /// Time-indexed arrival schedule.
    Scheduled(ScheduledInflow),
}

impl InflowSampler {
    /// Sampler that never adds anyone (quota 0).
    pub fn none() -> Self {
        InflowSampler::Quota(QuotaInflow::zero())
    }

    /// Draws the inflow for one step, one count per open state.
    ///
    /// # Errors
    ///
    /// Propagates sampler errors: missing schedule buckets
    /// (`LookupError`) and dimension mismatches (`ValidationError`).
    pub fn sample(&self, request: InflowRequest, rng: &mut ChainRng) -> Result<Vec<u64>, ChainError> {
        match self {
            InflowSampler::Quota(q) => Ok(q.sample(request.base_total, request.open_states, rng)?),
            InflowSampler::Scheduled(s) => s.sample(request.step, request.open_states, rng),
        }
    }

    /// Short policy name for logging.
    pub fn mode_name(&self) -> &'static str {
        match self {
            InflowSampler::Quota(_) => "quota",
            InflowSampler::Scheduled(_) => "scheduled",
        }
    }
}

impl From<QuotaInflow> for InflowSampler {
    fn from(q: QuotaInflow) -> Self {
        InflowSampler::Quota(q)
    }
}

impl From<ScheduledInflow> for InflowSampler {
    fn from(s: ScheduledInflow) -> Self {
        InflowSampler::Scheduled(s)
    }
}

/// Expands per-open-state inflow to the full state vector, inserting an
/// explicit 0 at `sink` when there is an absorbing column.
///
/// ```
/// use churn_models::inflow::with_sink_slot;
///
/// assert_eq!(with_sink_slot(&[5, 7], Some(2)), vec![5, 7, 0]);
/// assert_eq!(with_sink_slot(&[5, 7], Some(0)), vec![0, 5, 7]);
/// assert_eq!(with_sink_slot(&[5, 7], None), vec![5, 7]);
/// ```
pub fn with_sink_slot(open: &[u64], sink: Option<usize>) -> Vec<u64> {
    let mut full = open.to_vec();
    if let Some(index) = sink {
        full.insert(index.min(full.len()), 0);
    }
    full
}
