use crate::error::Result;
use crate::rng::RandomSource;
use crate::strategy::{ensure_candidates, Strategy};
use crate::types::{ArmId, ContextMap, ContextVector};

/// Uniform pick among the offered candidates; learns nothing.
///
/// The performance floor every other strategy is measured against.
#[derive(Debug, Clone)]
pub struct RandomChoice {
    rng: RandomSource,
}

impl RandomChoice {
    pub fn new(rng: RandomSource) -> Self {
        Self { rng }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(RandomSource::seeded(seed))
    }
}

impl Strategy for RandomChoice {
    fn name(&self) -> &str {
        "RandomChoice"
    }

    fn select(&mut self, candidates: &[ArmId], _contexts: Option<&ContextMap>) -> Result<ArmId> {
        ensure_candidates(candidates)?;
        let idx = self.rng.index(candidates.len());
        Ok(candidates[idx].clone())
    }

    fn update(&mut self, _arm: &ArmId, _reward: f64, _context: Option<&ContextVector>) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) {
        self.rng.reseed();
    }
}
