//! Thompson Sampling with a Beta-Bernoulli model.
//!
//! Core principles:
//! - Maintains Beta distribution parameters (alpha, beta) for each arm
//! - During selection, draws one sample from Beta(alpha, beta) per candidate
//!   and picks the highest draw
//! - Click (reward 1.0) -> alpha + 1, no click (reward 0.0) -> beta + 1
//!
//! Exploration is implicit: arms with little evidence have wide posteriors
//! and now and then sample high.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ThompsonConfig;
use crate::error::{BanditError, Result};
use crate::rng::RandomSource;
use crate::strategy::{ensure_candidates, Strategy};
use crate::types::{ArmId, ContextMap, ContextVector};

// ==================== Data Structures ====================

/// Beta distribution parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    /// Prior pseudo-clicks plus observed clicks
    pub alpha: f64,
    /// Prior pseudo-misses plus observed misses
    pub beta: f64,
}

impl BetaParams {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Mean of the Beta distribution
    pub fn expected_value(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Total pseudo-observations (alpha + beta)
    pub fn total(&self) -> f64 {
        self.alpha + self.beta
    }
}

// ==================== Main Implementation ====================

/// Beta-Bernoulli Thompson Sampling over lazily discovered arms.
#[derive(Debug, Clone)]
pub struct ThompsonSampling {
    /// Posterior per arm, created from the prior on first touch
    posteriors: HashMap<ArmId, BetaParams>,
    prior: BetaParams,
    rng: RandomSource,
    update_count: u64,
}

impl ThompsonSampling {
    pub fn new(config: ThompsonConfig, rng: RandomSource) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            posteriors: HashMap::new(),
            prior: BetaParams::new(config.prior_alpha, config.prior_beta),
            rng,
            update_count: 0,
        })
    }

    /// Default prior with a fixed seed (for testing)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            posteriors: HashMap::new(),
            prior: BetaParams::new(1.0, 8.0),
            rng: RandomSource::seeded(seed),
            update_count: 0,
        }
    }

    pub fn prior(&self) -> BetaParams {
        self.prior
    }

    /// Current posterior for `arm`; the prior for arms never seen.
    pub fn posterior(&self, arm: &ArmId) -> BetaParams {
        self.posteriors.get(arm).copied().unwrap_or(self.prior)
    }

    /// Overwrite the posterior of one arm, e.g. to warm-start from history.
    pub fn set_posterior(&mut self, arm: ArmId, alpha: f64, beta: f64) -> Result<()> {
        if !(alpha.is_finite() && beta.is_finite() && alpha > 0.0 && beta > 0.0) {
            return Err(BanditError::invalid_input(format!(
                "posterior shape must be positive, got ({alpha}, {beta})"
            )));
        }
        self.posteriors.insert(arm, BetaParams::new(alpha, beta));
        Ok(())
    }

    pub fn expected_value(&self, arm: &ArmId) -> f64 {
        self.posterior(arm).expected_value()
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    fn ensure_posterior(&mut self, arm: &ArmId) -> BetaParams {
        *self
            .posteriors
            .entry(arm.clone())
            .or_insert(self.prior)
    }
}

impl Strategy for ThompsonSampling {
    fn name(&self) -> &str {
        "ThompsonSampling"
    }

    fn select(&mut self, candidates: &[ArmId], _contexts: Option<&ContextMap>) -> Result<ArmId> {
        ensure_candidates(candidates)?;

        let mut best = &candidates[0];
        let mut best_sample = f64::NEG_INFINITY;
        for arm in candidates {
            let params = self.ensure_posterior(arm);
            let sample = self.rng.beta(params.alpha, params.beta)?;
            if sample > best_sample {
                best_sample = sample;
                best = arm;
            }
        }

        Ok(best.clone())
    }

    fn update(&mut self, arm: &ArmId, reward: f64, _context: Option<&ContextVector>) -> Result<()> {
        let prior = self.prior;
        let params = self.posteriors.entry(arm.clone()).or_insert(prior);
        if reward == 1.0 {
            params.alpha += 1.0;
        } else if reward == 0.0 {
            params.beta += 1.0;
        } else {
            return Err(BanditError::invalid_input(format!(
                "Beta-Bernoulli update needs reward 0.0 or 1.0, got {reward}"
            )));
        }
        self.update_count += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.posteriors.clear();
        self.update_count = 0;
        self.rng.reseed();
    }
}

// ==================== Unit Tests ====================
