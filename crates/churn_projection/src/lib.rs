//! # Churn Projection (L3: Projection Engine)
//!
//! Aggregate population projection over a Markov transition model.
//!
//! This crate turns a transition model, an initial population and an inflow
//! policy into a table of whole-entity counts per step and state:
//!
//! - [`config`]: `ProjectionConfig` and its validating builder
//! - [`projector`]: `PopulationProjector` with plain and absorbing variants
//! - [`table`]: `ProjectionTable`, the owned output
//! - [`ensemble`]: seeded parallel ensembles reduced to mean/min/max
//!
//! ## Row semantics
//!
//! Row 0 is the initial population as given. Row `t` is the truncated result
//! of applying the transition to row `t-1`, plus step `t`'s inflow. In an
//! absorbing projection the sink column holds the running total of everything
//! absorbed so far.
//!
//! ## Example
//!
//! ```rust
//! use churn_core::matrix::TransitionMatrix;
//! use churn_models::inflow::InflowSampler;
//! use churn_projection::config::ProjectionConfig;
//! use churn_projection::projector::{PopulationProjector, ProjectionKind};
//!
//! let matrix = TransitionMatrix::new(
//!     vec![vec![0.9, 0.1], vec![0.0, 1.0]],
//!     ["Active", "Churned"],
//! )
//! .unwrap();
//! let config = ProjectionConfig::builder().step_nr(5).build().unwrap();
//! let mut projector = PopulationProjector::new(matrix, config);
//!
//! let table = projector
//!     .run(ProjectionKind::Absorbing, &[100, 0], &InflowSampler::none())
//!     .unwrap();
//! assert_eq!(table.column("Churned").unwrap(), vec![0, 10, 19, 27, 34]);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ensemble;
pub mod projector;
pub mod table;

pub use config::{AbsorbingState, ProjectionConfig, ProjectionConfigBuilder};
pub use ensemble::{EnsembleSummary, ProjectionEnsemble, MAX_RUNS};
pub use projector::{PopulationProjector, ProjectionKind};
pub use table::ProjectionTable;
