//! # CLI Interface
//!
//! Command-line argument structure for `reward-keeper`, using `clap`
//! derive. Three subcommands: `run`, `check-config`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Reward keeper daemon.
///
/// Accepts collected rewards over HTTP, accumulates them per token and
/// disposition policy, and periodically swaps or forwards the totals.
#[derive(Parser, Debug)]
#[command(
    name = "reward-keeper",
    about = "Accumulates collected rewards and flushes them on a schedule",
    version,
    propagate_version = true
)]
pub struct KeeperCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the keeper: ingestion API, metrics endpoint, and flush scheduler.
    Run(RunArgs),
    /// Load and validate a configuration file, then print the resolved values.
    CheckConfig(CheckConfigArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the keeper configuration file (JSON).
    ///
    /// When omitted, built-in defaults are used.
    #[arg(long, short = 'c', env = "KEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides `api_port` from the config file.
    #[arg(long, env = "KEEPER_API_PORT")]
    pub api_port: Option<u16>,

    /// Overrides `metrics_port` from the config file.
    #[arg(long, env = "KEEPER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log output format.
    #[arg(long, value_enum, env = "KEEPER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Arguments for the `check-config` subcommand.
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Path to the configuration file to validate.
    #[arg(long, short = 'c', env = "KEEPER_CONFIG")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        KeeperCli::command().debug_assert();
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = KeeperCli::try_parse_from([
            "reward-keeper",
            "run",
            "--api-port",
            "9000",
            "--log-format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.api_port, Some(9000));
                assert_eq!(args.log_format, LogFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
