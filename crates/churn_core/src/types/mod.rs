//! Core types: state sets and error taxonomy.
//!
//! - [`StateSet`]: ordered labels with label↔index lookup
//! - [`ValidationError`], [`LookupError`], [`ChainError`]: error types

pub mod error;
pub mod states;

pub use error::{ChainError, LookupError, ValidationError};
pub use states::StateSet;
