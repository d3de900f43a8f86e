use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EpsilonGreedyConfig;
use crate::error::Result;
use crate::rng::RandomSource;
use crate::strategy::{ensure_candidates, ensure_finite_reward, Strategy};
use crate::types::{ArmId, ContextMap, ContextVector};

/// Pull count and running mean reward of one arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub pulls: u64,
    pub mean_reward: f64,
}

impl ArmStats {
    /// Incremental mean: `n <- n + 1; mu <- mu + r / n - mu / n`.
    ///
    /// Both terms are scaled before subtracting, so finite rewards keep the
    /// mean finite.
    fn observe(&mut self, reward: f64) {
        self.pulls += 1;
        let n = self.pulls as f64;
        self.mean_reward += reward / n - self.mean_reward / n;
    }
}

/// Explore uniformly with probability epsilon, otherwise exploit the best mean.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    config: EpsilonGreedyConfig,
    rng: RandomSource,
    stats: HashMap<ArmId, ArmStats>,
}

impl EpsilonGreedy {
    pub fn new(config: EpsilonGreedyConfig, rng: RandomSource) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            stats: HashMap::new(),
        })
    }

    pub fn with_seed(epsilon: f64, seed: u64) -> Result<Self> {
        Self::new(EpsilonGreedyConfig { epsilon }, RandomSource::seeded(seed))
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    pub fn arm_stats(&self, arm: &ArmId) -> Option<&ArmStats> {
        self.stats.get(arm)
    }

    pub fn arm_count(&self) -> usize {
        self.stats.len()
    }
}

impl Strategy for EpsilonGreedy {
    fn name(&self) -> &str {
        "EpsilonGreedy"
    }

    fn select(&mut self, candidates: &[ArmId], _contexts: Option<&ContextMap>) -> Result<ArmId> {
        ensure_candidates(candidates)?;

        for arm in candidates {
            self.stats.entry(arm.clone()).or_default();
        }

        if self.rng.chance(self.config.epsilon) {
            let idx = self.rng.index(candidates.len());
            return Ok(candidates[idx].clone());
        }

        // Strict comparison keeps the first candidate on ties.
        let mut best = &candidates[0];
        let mut best_mean = f64::NEG_INFINITY;
        for arm in candidates {
            let mean = self.stats.get(arm).map_or(0.0, |s| s.mean_reward);
            if mean > best_mean {
                best_mean = mean;
                best = arm;
            }
        }

        Ok(best.clone())
    }

    fn update(&mut self, arm: &ArmId, reward: f64, _context: Option<&ContextVector>) -> Result<()> {
        ensure_finite_reward(reward)?;
        self.stats.entry(arm.clone()).or_default().observe(reward);
        Ok(())
    }

    fn reset(&mut self) {
        self.stats.clear();
        self.rng.reseed();
    }
}
