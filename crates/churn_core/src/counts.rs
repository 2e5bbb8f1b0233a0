//! Integer population counts.
//!
//! Projections carry whole entities. Real-valued products of the matrix
//! multiply are truncated back to counts after every step; the small
//! systematic under-count this causes over long horizons is accepted.
//!
//! Counts are `u64`. Every sum and every conversion back from a real mass is
//! checked, and a population that no longer fits is reported as an
//! `InvalidParameter { name: "population", .. }` error instead of wrapping.

use crate::types::ValidationError;

/// Slack added before truncation so that values such as
/// `0.29 * 100.0 == 28.999999999999996` land on the intended integer.
pub const COUNT_EPSILON: f64 = 1e-7;

/// Relative distance to the nearest integer within which [`floor_nominal`]
/// treats a product as that integer.
pub const NOMINAL_RELATIVE_TOLERANCE: f64 = 1e-12;

/// First real mass that no longer truncates to a `u64` (2^64).
const MASS_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn overflow(what: &str) -> ValidationError {
    ValidationError::InvalidParameter {
        name: "population",
        value: format!("{what} overflows a 64-bit count"),
    }
}

/// Truncates a real-valued mass to a whole count.
///
/// Negative, NaN and infinite inputs map to 0; masses beyond `u64::MAX`
/// saturate. Use [`checked_floor_count`] where saturation would corrupt a
/// result.
///
/// # Examples
///
/// ```
/// use churn_core::counts::floor_count;
///
/// assert_eq!(floor_count(72.9), 72);
/// assert_eq!(floor_count(0.29 * 100.0), 29);
/// assert_eq!(floor_count(-3.0), 0);
/// ```
#[inline]
pub fn floor_count(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    (x + COUNT_EPSILON).floor() as u64
}

/// [`floor_count`] that rejects masses too large for a `u64`.
///
/// # Errors
///
/// `InvalidParameter { name: "population", .. }` for `+inf` or any mass of
/// at least 2^64.
pub fn checked_floor_count(x: f64) -> Result<u64, ValidationError> {
    if x == f64::INFINITY || x + COUNT_EPSILON >= MASS_LIMIT {
        return Err(overflow("projected mass"));
    }
    Ok(floor_count(x))
}

/// Truncates every entry of a real-valued vector.
///
/// # Errors
///
/// As [`checked_floor_count`].
pub fn floor_counts(values: &[f64]) -> Result<Vec<u64>, ValidationError> {
    values.iter().map(|&x| checked_floor_count(x)).collect()
}

/// Floor of a nominal product such as `T·q`.
///
/// Unlike [`floor_count`] no slack is added: the result never exceeds the
/// true floor unless `x` lies within [`NOMINAL_RELATIVE_TOLERANCE`] of an
/// integer, in which case it is that integer. Saturates like
/// [`floor_count`].
///
/// ```
/// use churn_core::counts::floor_nominal;
///
/// assert_eq!(floor_nominal(0.29 * 100.0), 29);
/// assert_eq!(floor_nominal(3.0 * 0.33333333), 0);
/// ```
pub fn floor_nominal(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    let nearest = x.round();
    if (x - nearest).abs() <= NOMINAL_RELATIVE_TOLERANCE * nearest.max(1.0) {
        nearest as u64
    } else {
        x.floor() as u64
    }
}

/// Converts counts to reals for the matrix multiply.
pub fn to_mass(counts: &[u64]) -> Vec<f64> {
    counts.iter().map(|&c| c as f64).collect()
}

/// Total population of a count vector.
///
/// # Errors
///
/// `InvalidParameter { name: "population", .. }` if the sum overflows.
#[inline]
pub fn total(counts: &[u64]) -> Result<u64, ValidationError> {
    counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or_else(|| overflow("population total"))
}

/// `a + b` for two counts.
///
/// # Errors
///
/// `InvalidParameter { name: "population", .. }` on overflow.
#[inline]
pub fn add_count(a: u64, b: u64) -> Result<u64, ValidationError> {
    a.checked_add(b).ok_or_else(|| overflow("state count"))
}

/// Adds `added` to `counts` element-wise.
///
/// `counts` is left untouched when any entry would overflow.
///
/// # Errors
///
/// `InvalidParameter { name: "population", .. }` on overflow.
pub fn add_counts(counts: &mut [u64], added: &[u64]) -> Result<(), ValidationError> {
    let summed = counts
        .iter()
        .zip(added)
        .map(|(&c, &a)| add_count(c, a))
        .collect::<Result<Vec<_>, _>>()?;
    for (count, sum) in counts.iter_mut().zip(summed) {
        *count = sum;
    }
    Ok(())
}
