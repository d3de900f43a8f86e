use serde::{Deserialize, Serialize};

use crate::types::ArmId;

/// What happened in one replayed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// 1-based position of the round in the input sequence
    pub round: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub arm: ArmId,
    pub reward: f64,
}

/// Ordered record of a strategy's choices over a full replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTrace {
    pub strategy: String,
    pub outcomes: Vec<Outcome>,
}

/// Aggregate click metrics of one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub strategy: String,
    pub total_impressions: usize,
    pub total_clicks: usize,
    pub click_through_rate: f64,
}

impl OutcomeTrace {
    pub fn new(strategy: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        Self {
            strategy: strategy.into(),
            outcomes,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.outcomes.iter()
    }

    pub fn rewards(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.reward).collect()
    }

    pub fn total_impressions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_clicks(&self) -> usize {
        self.outcomes.iter().filter(|o| o.reward > 0.0).count()
    }

    /// Fraction of rounds whose pick matched ground truth; 0.0 when empty.
    pub fn click_through_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.total_clicks() as f64 / self.outcomes.len() as f64
    }

    /// Running CTR after each round.
    pub fn cumulative_ctr(&self) -> Vec<f64> {
        let mut clicks = 0usize;
        self.outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| {
                if o.reward > 0.0 {
                    clicks += 1;
                }
                clicks as f64 / (i + 1) as f64
            })
            .collect()
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            strategy: self.strategy.clone(),
            total_impressions: self.total_impressions(),
            total_clicks: self.total_clicks(),
            click_through_rate: self.click_through_rate(),
        }
    }
}

impl<'a> IntoIterator for &'a OutcomeTrace {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_of(rewards: &[f64]) -> OutcomeTrace {
        let outcomes = rewards
            .iter()
            .enumerate()
            .map(|(i, &reward)| Outcome {
                round: i + 1,
                user_id: None,
                arm: ArmId::from("A"),
                reward,
            })
            .collect();
        OutcomeTrace::new("Test", outcomes)
    }

    #[test]
    fn test_empty_trace_metrics() {
        let trace = trace_of(&[]);
        assert_eq!(trace.click_through_rate(), 0.0);
        assert!(trace.cumulative_ctr().is_empty());
        assert!(trace.is_empty());
    }

    #[test]
    fn test_ctr_and_cumulative() {
        let trace = trace_of(&[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(trace.total_impressions(), 4);
        assert_eq!(trace.total_clicks(), 2);
        assert!((trace.click_through_rate() - 0.5).abs() < 1e-12);
        assert_eq!(trace.cumulative_ctr(), vec![1.0, 0.5, 1.0 / 3.0, 0.5]);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = trace_of(&[1.0, 0.0]).summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["strategy"], "Test");
        assert_eq!(json["total_clicks"], 1);
        assert_eq!(json["click_through_rate"], 0.5);
    }

    #[test]
    fn test_outcome_omits_missing_user() {
        let json = serde_json::to_string(&trace_of(&[1.0]).outcomes[0]).unwrap();
        assert_eq!(json, r#"{"round":1,"arm":"A","reward":1.0}"#);
    }
}
