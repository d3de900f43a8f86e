//! Seedable randomness shared by every strategy.
//!
//! Each strategy owns its own `RandomSource`, so concurrently evaluated
//! strategies never contend for one generator.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution};

use crate::error::{BanditError, Result};

/// ChaCha8-backed generator supplying uniform and Beta draws.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    seed: Option<u64>,
}

impl RandomSource {
    /// Seeded source; two sources with the same seed yield identical streams.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Unseeded source drawing its key from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            seed: None,
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Rewind to the start of the seeded stream. Unseeded sources are rekeyed.
    pub fn reseed(&mut self) {
        *self = Self::from_seed(self.seed);
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// One draw from `Beta(alpha, beta)`.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> Result<f64> {
        let dist = Beta::new(alpha, beta).map_err(|e| {
            BanditError::invalid_input(format!("Beta({alpha}, {beta}) is not a valid distribution: {e}"))
        })?;
        Ok(dist.sample(&mut self.rng))
    }
}
