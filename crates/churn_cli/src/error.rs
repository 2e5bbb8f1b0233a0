//! CLI error types

use churn_core::types::{ChainError, LookupError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Chain(err.into())
    }
}

impl From<LookupError> for CliError {
    fn from(err: LookupError) -> Self {
        CliError::Chain(err.into())
    }
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
