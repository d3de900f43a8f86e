//! Subscriber setup for binaries embedding the replay engine.
//!
//! The library only emits `tracing` events. A binary calls [`init_tracing`]
//! once, with the same [`SimulationConfig`] it replays with.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SimulationConfig;
use crate::error::{BanditError, Result};

const LOG_FILE_PREFIX: &str = "replay.log";

/// Flushes the replay log file until dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Event filter built from `config.log_level`.
pub fn replay_filter(config: &SimulationConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.log_level).map_err(|e| {
        BanditError::invalid_config(format!(
            "log_level {:?} is not a valid filter: {e}",
            config.log_level
        ))
    })
}

/// Install a global subscriber driven by `config`.
///
/// Events go to stdout, and also to a daily rolling `replay.log` when
/// `config.log_dir` is set. If a subscriber is already installed it stays in
/// place; the file guard is still returned.
pub fn init_tracing(config: &SimulationConfig) -> Result<Option<FileLogGuard>> {
    let filter = replay_filter(config)?;

    let (file_writer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                BanditError::invalid_config(format!("cannot create log directory {dir}: {e}"))
            })?;
            let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
            (Some(writer), Some(FileLogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    Ok(guard)
}
