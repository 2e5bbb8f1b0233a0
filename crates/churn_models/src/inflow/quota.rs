//! Quota-mode inflow: a fixed share of the base population per step.

use churn_core::counts::{checked_floor_count, floor_count, floor_nominal};
use churn_core::types::ValidationError;

use crate::rng::ChainRng;

/// Which population total the quota is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuotaBase {
    /// Total of the initial population vector, fixed for the whole run.
    #[default]
    Initial,
    /// Total present at the current step, before inflow.
    Current,
}

/// How Dirichlet shares are turned into whole entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QuotaRounding {
    /// Truncate each share; the realised total may fall short of the nominal.
    #[default]
    Truncate,
    /// Truncate, then hand the shortfall to the largest fractional parts so
    /// the realised total equals the nominal exactly.
    LargestRemainder,
}

/// Quota-mode inflow sampler.
///
/// Each step adds `floor(T·q)` entities, split across the open states by a
/// uniform Dirichlet draw.
///
/// # Examples
///
/// ```
/// use churn_models::inflow::QuotaInflow;
/// use churn_models::rng::ChainRng;
///
/// let quota = QuotaInflow::new(0.75).unwrap();
/// let mut rng = ChainRng::from_seed(1);
///
/// let inflow = quota.sample(1000, 4, &mut rng).unwrap();
/// assert_eq!(inflow.len(), 4);
/// assert!(inflow.iter().sum::<u64>() <= 750);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QuotaInflow {
    quota: f64,
    rounding: QuotaRounding,
}

impl QuotaInflow {
    /// Creates a sampler with truncating rounding.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `quota` is negative or non-finite.
    pub fn new(quota: f64) -> Result<Self, ValidationError> {
        if !quota.is_finite() || quota < 0.0 {
            return Err(ValidationError::InvalidParameter {
                name: "quota",
                value: format!("{quota} must be finite and non-negative"),
            });
        }
        Ok(Self {
            quota,
            rounding: QuotaRounding::Truncate,
        })
    }

    /// Sampler with quota 0.
    #[inline]
    pub fn zero() -> Self {
        Self {
            quota: 0.0,
            rounding: QuotaRounding::Truncate,
        }
    }

    /// Sets the rounding policy.
    #[inline]
    pub fn with_rounding(mut self, rounding: QuotaRounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Relative quota `q`.
    #[inline]
    pub fn quota(&self) -> f64 {
        self.quota
    }

    /// Rounding policy.
    #[inline]
    pub fn rounding(&self) -> QuotaRounding {
        self.rounding
    }

    /// Nominal inflow `floor(T·q)` for base total `T`.
    ///
    /// A product lying just below an integer is not rounded up, so
    /// `3 × 0.33333333` gives 0.
    #[inline]
    pub fn nominal(&self, base_total: u64) -> u64 {
        floor_nominal(base_total as f64 * self.quota)
    }

    /// Draws the inflow split across `open_states` states.
    ///
    /// A zero nominal inflow returns zeros without drawing.
    ///
    /// # Errors
    ///
    /// `InvalidParameter { name: "population", .. }` if `T·q` does not fit a
    /// count.
    pub fn sample(
        &self,
        base_total: u64,
        open_states: usize,
        rng: &mut ChainRng,
    ) -> Result<Vec<u64>, ValidationError> {
        checked_floor_count(base_total as f64 * self.quota)?;
        let nominal = self.nominal(base_total);
        if nominal == 0 || open_states == 0 {
            return Ok(vec![0; open_states]);
        }

        let shares: Vec<f64> = rng
            .dirichlet_uniform(open_states)?
            .into_iter()
            .map(|s| s * nominal as f64)
            .collect();

        let mut counts: Vec<u64> = shares.iter().map(|&s| floor_count(s)).collect();
        if self.rounding == QuotaRounding::LargestRemainder {
            distribute_remainder(&mut counts, &shares, nominal);
        }
        Ok(counts)
    }
}

fn distribute_remainder(counts: &mut [u64], shares: &[f64], nominal: u64) {
    let assigned = counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c));
    let mut shortfall = nominal.saturating_sub(assigned);
    if shortfall == 0 {
        return;
    }

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - counts[a] as f64;
        let fb = shares[b] - counts[b] as f64;
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    for i in order.into_iter().cycle() {
        if shortfall == 0 {
            break;
        }
        counts[i] += 1;
        shortfall -= 1;
    }
}
