//! Transition matrices.
//!
//! - [`TransitionMatrix`]: validated row-stochastic matrix with state lookup
//! - [`RowSumCheck`]: strict (default) or skipped row-sum validation

mod transition;

pub use transition::{RowSumCheck, TransitionMatrix, DEFAULT_ROW_SUM_TOLERANCE};
