use thiserror::Error;

/// Errors raised by strategies, the replay engine and configuration.
///
/// Every variant is fatal at the point it is raised: nothing in this crate
/// retries or salvages partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BanditError {
    /// Malformed arguments to a strategy call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed round data reaching the engine. `round` is 1-based.
    #[error("invalid round {round}: {reason}")]
    InvalidRound { round: usize, reason: String },

    /// Hyperparameters rejected at construction time.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl BanditError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_round(round: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRound {
            round,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_invalid_round(&self) -> bool {
        matches!(self, Self::InvalidRound { .. })
    }
}

pub type Result<T> = std::result::Result<T, BanditError>;
