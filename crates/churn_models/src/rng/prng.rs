//! Seeded pseudo-random number generator for chain sampling.
//!
//! This module provides [`ChainRng`], a seeded PRNG wrapper exposing the
//! handful of draws the models need: uniform, categorical, Dirichlet and
//! multinomial.

use churn_core::types::ValidationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Dirichlet, Distribution};

/// Random number generator for inflow and trajectory sampling.
///
/// The same seed always produces the same sequence of draws, so projections
/// are reproducible.
///
/// # Examples
///
/// ```rust
/// use churn_models::rng::ChainRng;
///
/// let mut rng = ChainRng::from_seed(42);
///
/// let u = rng.gen_uniform();
/// assert!((0.0..1.0).contains(&u));
///
/// let next = rng.categorical(&[0.0, 1.0]);
/// assert_eq!(next, 1);
///
/// let split = rng.multinomial(100, &[0.5, 0.5]).unwrap();
/// assert_eq!(split.iter().sum::<u64>(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct ChainRng {
    inner: StdRng,
    seed: u64,
}

impl ChainRng {
    /// Creates a new RNG initialised with the given seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Draws an index with probability proportional to `weights`.
    ///
    /// Weights need not be normalised. Zero-weight indices are never chosen
    /// unless every weight is zero, in which case the last index is returned.
    /// An empty slice returns 0.
    pub fn categorical(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return weights.len().saturating_sub(1);
        }

        let target = self.gen_uniform() * total;
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = i;
            if target < cumulative {
                return i;
            }
        }
        last_positive
    }

    /// Draws a point on the simplex from Dirichlet(`alpha`).
    ///
    /// A single component degenerates to `[1.0]`; an empty `alpha` yields an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if any concentration is not strictly positive.
    pub fn dirichlet(&mut self, alpha: &[f64]) -> Result<Vec<f64>, ValidationError> {
        if alpha.iter().any(|&a| !a.is_finite() || a <= 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: "alpha",
                value: "Dirichlet concentrations must be positive and finite".to_string(),
            });
        }
        match alpha.len() {
            0 => Ok(Vec::new()),
            1 => Ok(vec![1.0]),
            _ => {
                let dist = Dirichlet::new(alpha).map_err(|e| ValidationError::InvalidParameter {
                    name: "alpha",
                    value: e.to_string(),
                })?;
                Ok(dist.sample(&mut self.inner))
            }
        }
    }

    /// Uniform point on the `k`-simplex (Dirichlet with all concentrations 1).
    pub fn dirichlet_uniform(&mut self, k: usize) -> Result<Vec<f64>, ValidationError> {
        self.dirichlet(&vec![1.0; k])
    }

    /// Splits `trials` across categories by a multinomial draw.
    ///
    /// Drawn as a sequence of conditional binomials. `probs` is normalised
    /// internally; the result always sums to `trials`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `probs` is empty, contains a negative or
    /// non-finite value, or sums to zero.
    pub fn multinomial(&mut self, trials: u64, probs: &[f64]) -> Result<Vec<u64>, ValidationError> {
        let invalid = |value: &str| ValidationError::InvalidParameter {
            name: "probs",
            value: value.to_string(),
        };
        if probs.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if probs.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(invalid("must be non-negative and finite"));
        }
        let total: f64 = probs.iter().sum();
        if total <= 0.0 {
            return Err(invalid("must not sum to zero"));
        }

        let normalised: Vec<f64> = probs.iter().map(|p| p / total).collect();
        // tail[i]: mass of categories i.., summed from the back
        let mut tail = vec![0.0; probs.len() + 1];
        for i in (0..probs.len()).rev() {
            tail[i] = tail[i + 1] + normalised[i];
        }

        let mut counts = vec![0u64; probs.len()];
        let mut remaining = trials;
        for (i, &p) in normalised.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            // Last category with positive mass takes the rest.
            if tail[i + 1] <= 0.0 {
                counts[i] = remaining;
                break;
            }
            let conditional = (p / tail[i]).clamp(0.0, 1.0);
            let draw = Binomial::new(remaining, conditional)
                .map_err(|e| invalid(&e.to_string()))?
                .sample(&mut self.inner);
            counts[i] = draw;
            remaining -= draw;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ChainRng::from_seed(7);
        let mut b = ChainRng::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.gen_uniform(), b.gen_uniform());
        }
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_categorical_skips_zero_weights() {
        let mut rng = ChainRng::from_seed(1);
        for _ in 0..200 {
            let i = rng.categorical(&[0.0, 0.3, 0.0, 0.7]);
            assert!(i == 1 || i == 3);
        }
        assert_eq!(rng.categorical(&[0.0, 0.0]), 1);
        assert_eq!(rng.categorical(&[]), 0);
    }

    #[test]
    fn test_categorical_frequencies() {
        let mut rng = ChainRng::from_seed(99);
        let n = 20_000;
        let hits = (0..n).filter(|_| rng.categorical(&[0.8, 0.2]) == 0).count();
        assert_relative_eq!(hits as f64 / n as f64, 0.8, epsilon = 0.02);
    }

    #[test]
    fn test_dirichlet_on_simplex() {
        let mut rng = ChainRng::from_seed(3);
        for k in 2..6 {
            let d = rng.dirichlet_uniform(k).unwrap();
            assert_eq!(d.len(), k);
            assert!(d.iter().all(|&x| (0.0..=1.0).contains(&x)));
            assert_relative_eq!(d.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
        assert_eq!(rng.dirichlet_uniform(1).unwrap(), vec![1.0]);
        assert!(rng.dirichlet_uniform(0).unwrap().is_empty());
    }

    #[test]
    fn test_dirichlet_rejects_bad_alpha() {
        let mut rng = ChainRng::from_seed(3);
        assert!(rng.dirichlet(&[1.0, 0.0]).is_err());
        assert!(rng.dirichlet(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_multinomial_sums_to_trials() {
        let mut rng = ChainRng::from_seed(11);
        for trials in [0u64, 1, 17, 1000] {
            let split = rng.multinomial(trials, &[0.2, 0.5, 0.3]).unwrap();
            assert_eq!(split.len(), 3);
            assert_eq!(split.iter().sum::<u64>(), trials);
        }
    }

    #[test]
    fn test_multinomial_respects_zero_probability() {
        let mut rng = ChainRng::from_seed(5);
        let split = rng.multinomial(500, &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(split, vec![0, 500, 0]);
    }

    #[test]
    fn test_multinomial_trailing_zero_gets_nothing() {
        let mut rng = ChainRng::from_seed(8);
        for _ in 0..200 {
            let split = rng.multinomial(1000, &[0.1, 0.2, 0.7, 0.0]).unwrap();
            assert_eq!(split[3], 0);
            assert_eq!(split.iter().sum::<u64>(), 1000);

            let split = rng.multinomial(50, &[0.3, 0.0, 0.7, 0.0]).unwrap();
            assert_eq!(split[1], 0);
            assert_eq!(split[3], 0);
        }
    }

    #[test]
    fn test_multinomial_rejects_bad_probs() {
        let mut rng = ChainRng::from_seed(5);
        assert!(rng.multinomial(10, &[]).is_err());
        assert!(rng.multinomial(10, &[0.5, -0.5]).is_err());
        assert!(rng.multinomial(10, &[0.0, 0.0]).is_err());
    }
}
