use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::epsilon_greedy::EpsilonGreedy;
use crate::error::{BanditError, Result};
use crate::linucb::LinUcb;
use crate::random_choice::RandomChoice;
use crate::rng::RandomSource;
use crate::thompson::ThompsonSampling;
use crate::types::{ArmId, ContextMap, ContextVector};

/// Capability contract shared by every decision algorithm.
///
/// The engine drives implementors through `select` then `update` once per
/// round and never looks past this trait.
pub trait Strategy {
    /// Stable display name, used in traces and logs.
    fn name(&self) -> &str;

    /// Whether `select` and `update` need per-candidate context vectors.
    fn requires_context(&self) -> bool {
        false
    }

    /// Context dimension the strategy is already committed to, if any.
    fn context_dimension(&self) -> Option<usize> {
        None
    }

    /// Pick exactly one member of `candidates`.
    ///
    /// Fails with `InvalidInput` when `candidates` is empty.
    fn select(&mut self, candidates: &[ArmId], contexts: Option<&ContextMap>) -> Result<ArmId>;

    /// Fold the observed reward for `arm` into the strategy's state.
    ///
    /// Arms never seen before are initialized on first touch.
    fn update(&mut self, arm: &ArmId, reward: f64, context: Option<&ContextVector>) -> Result<()>;

    /// Forget every per-arm statistic, keeping hyperparameters.
    fn reset(&mut self);
}

pub(crate) fn ensure_candidates(candidates: &[ArmId]) -> Result<()> {
    if candidates.is_empty() {
        return Err(BanditError::invalid_input("empty candidate set"));
    }
    Ok(())
}

pub(crate) fn ensure_finite_reward(reward: f64) -> Result<()> {
    if !reward.is_finite() {
        return Err(BanditError::invalid_input(format!(
            "reward must be finite, got {reward}"
        )));
    }
    Ok(())
}

/// Strategy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RandomChoice,
    EpsilonGreedy,
    ThompsonSampling,
    #[serde(rename = "linucb")]
    LinUcb,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::RandomChoice,
        StrategyKind::EpsilonGreedy,
        StrategyKind::ThompsonSampling,
        StrategyKind::LinUcb,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random_choice" | "random" => Some(StrategyKind::RandomChoice),
            "epsilon_greedy" | "egreedy" => Some(StrategyKind::EpsilonGreedy),
            "thompson_sampling" | "thompson" => Some(StrategyKind::ThompsonSampling),
            "linucb" => Some(StrategyKind::LinUcb),
            _ => None,
        }
    }
}

/// Build a fresh strategy of `kind` with its own seeded randomness source.
pub fn build_strategy(
    kind: StrategyKind,
    config: &SimulationConfig,
) -> Result<Box<dyn Strategy + Send>> {
    let rng = RandomSource::from_seed(config.seed_for(kind));
    let strategy: Box<dyn Strategy + Send> = match kind {
        StrategyKind::RandomChoice => Box::new(RandomChoice::new(rng)),
        StrategyKind::EpsilonGreedy => {
            Box::new(EpsilonGreedy::new(config.epsilon_greedy.clone(), rng)?)
        }
        StrategyKind::ThompsonSampling => {
            Box::new(ThompsonSampling::new(config.thompson.clone(), rng)?)
        }
        StrategyKind::LinUcb => Box::new(LinUcb::new(config.linucb.clone())?),
    };
    Ok(strategy)
}
