// src/logging.rs

//! Logging setup for `serverun` using `tracing` + `tracing-subscriber`.
//!
//! Everything goes to stderr. Stdout belongs to the command being run
//! (and to `--dry-run` output), so it has to stay clean.
//!
//! Level selection, most specific wins:
//! 1. the `--log-level` flag
//! 2. the `SERVERUN_LOG` environment variable
//! 3. `info`

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Install the global subscriber. Call once, before the runtime spins
/// up.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_max_level(effective_level(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn effective_level(cli_level: Option<LogLevel>) -> LevelFilter {
    if let Some(level) = cli_level {
        return match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        };
    }

    match std::env::var("SERVERUN_LOG") {
        Ok(value) => value
            .trim()
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::INFO),
        Err(_) => LevelFilter::INFO,
    }
}
