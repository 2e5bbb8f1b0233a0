//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. Commands write their
//! result to the given writer and log progress through `tracing`.

pub mod project;
pub mod simulate;
pub mod trajectory;
pub mod value;
