#![deny(clippy::all)]

pub mod comparison;
pub mod config;
pub mod engine;
pub mod epsilon_greedy;
pub mod error;
pub mod linucb;
pub mod logging;
pub mod random_choice;
pub mod rng;
pub mod sanitize;
pub mod strategy;
pub mod thompson;
pub mod trace;
pub mod types;

// Re-export main types and functions
pub use comparison::{compare, compare_from_config};
pub use config::{EpsilonGreedyConfig, LinUcbConfig, SimulationConfig, ThompsonConfig};
pub use engine::run;
pub use epsilon_greedy::{ArmStats, EpsilonGreedy};
pub use error::{BanditError, Result};
pub use linucb::{ArmModel, LinUcb, UcbStats};
pub use random_choice::RandomChoice;
pub use rng::RandomSource;
pub use sanitize::DiagnosticResult;
pub use strategy::{build_strategy, Strategy, StrategyKind};
pub use thompson::{BetaParams, ThompsonSampling};
pub use trace::{Outcome, OutcomeTrace, TraceSummary};
pub use types::{ArmId, ContextMap, ContextVector, Round};
