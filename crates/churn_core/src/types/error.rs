//! Error types for structured error handling.
//!
//! This module provides:
//! - `ValidationError`: malformed matrices, dimension mismatches, bad parameters
//! - `LookupError`: missing states, markets, schedule buckets and prices
//! - `ChainError`: either of the above, for operations that can fail both ways

use thiserror::Error;

/// Input validation errors.
///
/// Raised at construction or at the start of a projection when the supplied
/// data cannot describe a valid chain. Each variant names the offending input.
///
/// # Examples
///
/// ```
/// use churn_core::types::ValidationError;
///
/// let err = ValidationError::RowNotStochastic { row: 0, sum: 0.9 };
/// assert!(format!("{}", err).contains("row 0"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Fewer than two states were supplied.
    #[error("Too few states: got {got}, need at least 2")]
    TooFewStates {
        /// Number of states provided
        got: usize,
    },

    /// A state label appears more than once.
    #[error("Duplicate state label: {label}")]
    DuplicateState {
        /// The repeated label
        label: String,
    },

    /// A state label is empty.
    #[error("Empty state label at index {index}")]
    EmptyLabel {
        /// Position of the empty label
        index: usize,
    },

    /// Matrix rows have different lengths or the matrix is not square.
    #[error("Ragged matrix: row {row} has {got} columns, expected {expected}")]
    RaggedMatrix {
        /// Offending row index
        row: usize,
        /// Expected column count
        expected: usize,
        /// Actual column count
        got: usize,
    },

    /// A transition probability is negative.
    #[error("Negative probability {value} at ({row}, {col})")]
    NegativeProbability {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
        /// The negative value
        value: f64,
    },

    /// A matrix entry or parameter is NaN or infinite.
    #[error("Non-finite entry at ({row}, {col})")]
    NonFiniteEntry {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// A matrix row does not sum to one within tolerance.
    #[error("Row not stochastic: row {row} sums to {sum} (expected 1.0)")]
    RowNotStochastic {
        /// Row index
        row: usize,
        /// Actual row sum
        sum: f64,
    },

    /// Two sequences that must align have different lengths.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being compared (e.g. "initial population")
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Step count outside the supported range.
    #[error("Invalid step count {0}: must be in range [1, {max}]", max = crate::MAX_STEPS)]
    InvalidStepCount(usize),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Description of the invalid value
        value: String,
    },
}

/// Lookup errors for keyed data.
///
/// # Examples
///
/// ```
/// use churn_core::types::LookupError;
///
/// let err = LookupError::UnknownMarket { market: "FR".to_string() };
/// assert_eq!(format!("{}", err), "Unknown market: FR");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// State label not present in the state set.
    #[error("Unknown state: {label}")]
    UnknownState {
        /// The label that was looked up
        label: String,
    },

    /// Market key not present in the price table.
    #[error("Unknown market: {market}")]
    UnknownMarket {
        /// The market that was looked up
        market: String,
    },

    /// Inflow schedule has no entry for the derived hour bucket.
    #[error("Missing schedule bucket {bucket} for step {step}")]
    MissingBucket {
        /// Step counter that produced the bucket
        step: usize,
        /// Derived hour bucket
        bucket: u32,
    },

    /// Price vector has no price for a state.
    #[error("Missing price for state {state} in market {market}")]
    MissingPrice {
        /// Market of the price vector
        market: String,
        /// State without a price
        state: String,
    },
}

/// Any error raised by chain construction, projection or valuation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// Validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lookup failure.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ChainError {
    /// Returns `true` for validation failures.
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(self, ChainError::Validation(_))
    }

    /// Returns `true` for lookup failures.
    #[inline]
    pub fn is_lookup(&self) -> bool {
        matches!(self, ChainError::Lookup(_))
    }
}
