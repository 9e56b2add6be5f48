//! # Structured Logging
//!
//! Sets up the `tracing` subscriber for the keeper. Output goes to stderr so
//! stdout stays free for `check-config` and `version`.
//!
//! The tracker logs every dispatch with `token`, `policy`, `amount` and
//! `error` fields. In JSON mode those fields are flattened onto the top-level
//! object so a log pipeline can group failures per bucket without parsing
//! the message text.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: keeper and tracker at `info`,
/// request traces from the API at `info`, everything else at `warn`.
pub const DEFAULT_DIRECTIVES: &str = "warn,reward_keeper=info,reward_tracker=info,tower_http=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for a terminal.
    Pretty,
    /// One JSON object per event, dispatch fields at the top level.
    Json,
}

/// `RUST_LOG` if it parses, [`DEFAULT_DIRECTIVES`] otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("failed to install tracing subscriber")?;

    tracing::debug!(?format, "logging initialized");
    Ok(())
}
