//! # Random Number Generation
//!
//! Seeded randomness for inflow and trajectory sampling.
//!
//! - **Reproducibility**: every generator is seeded; equal seeds give equal draws
//! - **Injectability**: projectors accept a caller-supplied [`ChainRng`]
//!
//! ```rust
//! use churn_models::rng::ChainRng;
//!
//! let mut rng = ChainRng::from_seed(12345);
//! let shares = rng.dirichlet_uniform(3).unwrap();
//! assert_eq!(shares.len(), 3);
//! ```

mod prng;

pub use prng::ChainRng;
