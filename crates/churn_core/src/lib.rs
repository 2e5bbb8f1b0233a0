//! # churn_core: Foundation for Markov Customer-State Projection
//!
//! ## Layer 1 (Foundation) Role
//!
//! churn_core is the bottom layer of the churnflow workspace, providing:
//! - State sets with a single bidirectional label↔index lookup (`types::states`)
//! - Validated row-stochastic transition matrices (`matrix`)
//! - Integer count arithmetic used by the projector (`counts`)
//! - Error types: `ValidationError`, `LookupError`, `ChainError` (`types::error`)
//!
//! Layer 1 has no dependencies on other churn_* crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use churn_core::matrix::TransitionMatrix;
//! use churn_core::types::ValidationError;
//!
//! let m = TransitionMatrix::new(
//!     vec![vec![0.9, 0.1], vec![0.0, 1.0]],
//!     ["Active", "Churned"],
//! )
//! .unwrap();
//! assert_eq!(m.index_of("Churned").unwrap(), 1);
//!
//! // Rows must sum to one
//! let bad = TransitionMatrix::new(vec![vec![0.6, 0.3], vec![0.0, 1.0]], ["A", "B"]);
//! assert!(matches!(bad, Err(ValidationError::RowNotStochastic { row: 0, .. })));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for `StateSet`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod counts;
pub mod matrix;
pub mod types;

/// Maximum number of projection steps.
pub const MAX_STEPS: usize = 100_000;
