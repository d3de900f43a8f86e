use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};
use crate::strategy::StrategyKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsilonGreedyConfig {
    /// Probability of a uniformly random pick.
    pub epsilon: f64,
}

impl Default for EpsilonGreedyConfig {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl EpsilonGreedyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BanditError::invalid_config(format!(
                "epsilon must lie in [0, 1], got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Beta prior for every arm's click rate.
///
/// The default Beta(1, 8) expects roughly an 11% click rate. With a large
/// catalog and few observations per arm, the flat Beta(1, 1) keeps posteriors
/// near the prior for too long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThompsonConfig {
    pub prior_alpha: f64,
    pub prior_beta: f64,
}

impl Default for ThompsonConfig {
    fn default() -> Self {
        Self {
            prior_alpha: 1.0,
            prior_beta: 8.0,
        }
    }
}

impl ThompsonConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("prior_alpha", self.prior_alpha), ("prior_beta", self.prior_beta)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BanditError::invalid_config(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinUcbConfig {
    /// Exploration coefficient scaling the confidence width.
    pub alpha: f64,
    /// Ridge constant; each arm starts from `A = lambda * I`.
    pub lambda: f64,
    /// Context dimension. Learned from the first vector seen when `None`.
    pub dimension: Option<usize>,
}

impl Default for LinUcbConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            lambda: 1.0,
            dimension: None,
        }
    }
}

impl LinUcbConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(BanditError::invalid_config(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(BanditError::invalid_config(format!(
                "lambda must be finite and positive, got {}",
                self.lambda
            )));
        }
        if self.dimension == Some(0) {
            return Err(BanditError::invalid_config("dimension must be positive"));
        }
        Ok(())
    }
}

/// Everything needed to build and compare a set of strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed; each strategy derives its own stream from it.
    pub seed: Option<u64>,
    pub strategies: Vec<StrategyKind>,
    pub epsilon_greedy: EpsilonGreedyConfig,
    pub thompson: ThompsonConfig,
    pub linucb: LinUcbConfig,
    /// `EnvFilter` directive for [`crate::logging::init_tracing`].
    pub log_level: String,
    /// Directory for the rolling replay log; stdout only when `None`.
    pub log_dir: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            strategies: StrategyKind::ALL.to_vec(),
            epsilon_greedy: EpsilonGreedyConfig::default(),
            thompson: ThompsonConfig::default(),
            linucb: LinUcbConfig::default(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl SimulationConfig {
    /// Defaults overlaid with `BANDIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BanditError::invalid_config(format!("malformed config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.epsilon_greedy.validate()?;
        self.thompson.validate()?;
        self.linucb.validate()?;
        if self.strategies.is_empty() {
            return Err(BanditError::invalid_config("no strategies configured"));
        }
        Ok(())
    }

    /// Seed for one strategy kind, distinct per kind so streams are independent.
    pub fn seed_for(&self, kind: StrategyKind) -> Option<u64> {
        self.seed
            .map(|s| s.wrapping_add((kind as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parse_f64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        if let Some(seed) = lookup("BANDIT_SEED").and_then(|v| v.trim().parse::<u64>().ok()) {
            config.seed = Some(seed);
        }
        if let Some(epsilon) = parse_f64("BANDIT_EPSILON") {
            config.epsilon_greedy.epsilon = epsilon;
        }
        if let Some(alpha) = parse_f64("BANDIT_PRIOR_ALPHA") {
            config.thompson.prior_alpha = alpha;
        }
        if let Some(beta) = parse_f64("BANDIT_PRIOR_BETA") {
            config.thompson.prior_beta = beta;
        }
        if let Some(alpha) = parse_f64("BANDIT_UCB_ALPHA") {
            config.linucb.alpha = alpha;
        }
        if let Some(lambda) = parse_f64("BANDIT_RIDGE_LAMBDA") {
            config.linucb.lambda = lambda;
        }
        if let Some(list) = lookup("BANDIT_STRATEGIES") {
            let kinds: Vec<StrategyKind> = list
                .split(',')
                .filter_map(|name| StrategyKind::parse(name.trim()))
                .collect();
            if !kinds.is_empty() {
                config.strategies = kinds;
            }
        }
        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = level;
        }
        if let Some(dir) = lookup("BANDIT_LOG_DIR").filter(|d| !d.trim().is_empty()) {
            config.log_dir = Some(dir);
        }

        config
    }
}
