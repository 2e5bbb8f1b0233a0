//! # churn_models: Transition Dynamics and Inflow for churnflow
//!
//! ## Layer 2 (Models) Role
//!
//! Builds on churn_core with everything that involves randomness:
//! - Seeded random number generation (`rng`)
//! - Transition models: homogeneous or clustered (`model`)
//! - Inflow samplers: quota or scheduled (`inflow`)
//! - Individual trajectory sampling (`trajectory`)
//! - Entity-level customer simulation with newcomers (`simulation`)
//!
//! ## Usage Examples
//!
//! ```rust
//! use churn_core::matrix::TransitionMatrix;
//! use churn_models::inflow::{InflowRequest, InflowSampler, QuotaInflow};
//! use churn_models::model::TransitionModelEnum;
//! use churn_models::rng::ChainRng;
//! use churn_models::trajectory::generate_states;
//!
//! let m = TransitionMatrix::new(
//!     vec![vec![0.9, 0.1], vec![0.0, 1.0]],
//!     ["Active", "Churned"],
//! )
//! .unwrap();
//! let model = TransitionModelEnum::homogeneous(m);
//! let mut rng = ChainRng::from_seed(42);
//!
//! let path = generate_states(&model, &mut rng, "Active", 12).unwrap();
//! assert_eq!(path.len(), 12);
//!
//! let sampler = InflowSampler::from(QuotaInflow::new(0.1).unwrap());
//! let request = InflowRequest { step: 1, base_total: 500, open_states: 1 };
//! assert_eq!(sampler.sample(request, &mut rng).unwrap(), vec![50]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialisation for quota policy enums and customer
//!   histories

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod inflow;
pub mod model;
pub mod rng;
pub mod simulation;
pub mod trajectory;
