//! Sequential replay of rounds through one strategy.
//!
//! For each round, in input order:
//! 1. Validate the round (candidates, ground truth, contexts when needed)
//! 2. Ask the strategy to select one candidate
//! 3. Resolve the reward against the round's rewarded arm
//! 4. Feed the reward back through `update`
//! 5. Append the outcome to the trace
//!
//! A malformed round aborts the whole run; nothing is skipped or repaired.

use tracing::{info, trace, warn};

use crate::error::{BanditError, Result};
use crate::strategy::Strategy;
use crate::trace::{Outcome, OutcomeTrace};
use crate::types::Round;

/// Replay `rounds` through `strategy` and record every choice.
///
/// Round `i` is fully resolved (select and update) before round `i + 1`
/// starts. The engine only talks to the strategy through [`Strategy`].
pub fn run<'r, S, I>(strategy: &mut S, rounds: I) -> Result<OutcomeTrace>
where
    S: Strategy + ?Sized,
    I: IntoIterator<Item = &'r Round>,
{
    let name = strategy.name().to_string();
    let needs_context = strategy.requires_context();
    let mut dim = strategy.context_dimension();
    let mut outcomes = Vec::new();

    info!(strategy = %name, needs_context, "simulation started");

    for (idx, round) in rounds.into_iter().enumerate() {
        let number = idx + 1;

        dim = round
            .validate(number, needs_context, dim)
            .map_err(|err| {
                warn!(strategy = %name, round = number, error = %err, "rejected round");
                err
            })?;

        let contexts = if needs_context {
            round.contexts.as_ref()
        } else {
            None
        };
        let chosen = strategy.select(&round.candidates, contexts)?;
        if !round.candidates.contains(&chosen) {
            return Err(BanditError::invalid_input(format!(
                "{name} selected {chosen} in round {number}, which was not offered"
            )));
        }

        let reward = if chosen == round.rewarded { 1.0 } else { 0.0 };
        let context = if needs_context {
            round.context_for(&chosen)
        } else {
            None
        };
        strategy.update(&chosen, reward, context)?;

        trace!(strategy = %name, round = number, arm = %chosen, reward, "round resolved");
        outcomes.push(Outcome {
            round: number,
            user_id: round.user_id.clone(),
            arm: chosen,
            reward,
        });
    }

    let trace = OutcomeTrace::new(name, outcomes);
    info!(
        strategy = %trace.strategy,
        rounds = trace.total_impressions(),
        clicks = trace.total_clicks(),
        ctr = trace.click_through_rate(),
        "simulation finished"
    );
    Ok(trace)
}
