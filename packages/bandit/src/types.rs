use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{BanditError, Result};

/// Identifier of a candidate item (for example a news article id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArmId(String);

impl ArmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArmId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ArmId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fixed-length numeric description of a (user, candidate) pair.
///
/// Immutable once built; strategies only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextVector(Vec<f64>);

impl ContextVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f64>> for ContextVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Per-candidate context vectors for one round.
pub type ContextMap = HashMap<ArmId, ContextVector>;

/// One decision opportunity replayed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub user_id: Option<String>,
    pub candidates: Vec<ArmId>,
    #[serde(default)]
    pub contexts: Option<ContextMap>,
    /// The single arm that yields reward 1.0 in this round.
    pub rewarded: ArmId,
}

impl Round {
    pub fn new<I, A>(candidates: I, rewarded: impl Into<ArmId>) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ArmId>,
    {
        Self {
            user_id: None,
            candidates: candidates.into_iter().map(Into::into).collect(),
            contexts: None,
            rewarded: rewarded.into(),
        }
    }

    pub fn with_contexts(mut self, contexts: ContextMap) -> Self {
        self.contexts = Some(contexts);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn context_for(&self, arm: &ArmId) -> Option<&ContextVector> {
        self.contexts.as_ref().and_then(|m| m.get(arm))
    }

    /// Check the round before it is replayed.
    ///
    /// `round` is the 1-based position used in error reports. When
    /// `needs_context` is set every candidate must carry a vector whose
    /// dimension matches `expected_dim` (or, for the first round of a run,
    /// each other). Returns the dimension the run should use from now on.
    pub fn validate(
        &self,
        round: usize,
        needs_context: bool,
        expected_dim: Option<usize>,
    ) -> Result<Option<usize>> {
        if self.candidates.is_empty() {
            return Err(BanditError::invalid_round(round, "empty candidate set"));
        }

        if !self.candidates.contains(&self.rewarded) {
            return Err(BanditError::invalid_round(
                round,
                format!("rewarded arm {} not among candidates", self.rewarded),
            ));
        }

        if !needs_context {
            return Ok(expected_dim);
        }

        let contexts = self.contexts.as_ref().ok_or_else(|| {
            BanditError::invalid_round(round, "context-aware strategy but round has no contexts")
        })?;

        let mut dim = expected_dim;
        for arm in &self.candidates {
            let x = contexts.get(arm).ok_or_else(|| {
                BanditError::invalid_round(round, format!("missing context for candidate {arm}"))
            })?;
            match dim {
                Some(d) if d != x.dim() => {
                    return Err(BanditError::invalid_round(
                        round,
                        format!(
                            "context for {arm} has dimension {}, expected {d}",
                            x.dim()
                        ),
                    ));
                }
                Some(_) => {}
                None => dim = Some(x.dim()),
            }
        }

        Ok(dim)
    }
}
