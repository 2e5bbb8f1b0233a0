//! # churnflow CLI (S: Service Layer)
//!
//! Scenario-driven front end over the projection and valuation crates.
//!
//! # Commands
//!
//! - `churnflow project` - Project the scenario population (optionally as an ensemble)
//! - `churnflow value --market <M>` - Project and value in one market
//! - `churnflow trajectory --start <STATE>` - Sample individual state paths
//!
//! Scenarios are TOML files; see [`config::ScenarioConfig`].

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::{CliError, Result};

/// Crate version reported at startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
