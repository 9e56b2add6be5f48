// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Reward Keeper
//!
//! Entry point for the `reward-keeper` binary. Parses CLI arguments,
//! initializes logging and metrics, starts the flush scheduler, and serves
//! the ingestion API.
//!
//! The binary supports three subcommands:
//!
//! - `run`          — start the keeper
//! - `check-config` — validate a config file and print the resolved values
//! - `version`      — print build version information

mod api;
mod cli;
mod config;
mod executor;
mod logging;
mod metrics;
mod scheduler;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use reward_tracker::{Executors, RewardTracker};

use cli::{Commands, KeeperCli};
use config::KeeperConfig;
use executor::DryRunExecutor;
use metrics::KeeperMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KeeperCli::parse();

    match cli.command {
        Commands::Run(args) => run_keeper(args).await,
        Commands::CheckConfig(args) => check_config(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the keeper: API server, metrics endpoint, and flush scheduler.
async fn run_keeper(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(args.log_format)?;

    let mut config = match &args.config {
        Some(path) => KeeperConfig::load(path)?,
        None => KeeperConfig::default(),
    };
    if let Some(port) = args.api_port {
        config.api_port = port;
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = port;
    }
    config.validate().context("invalid keeper configuration")?;

    tracing::info!(
        api_port = config.api_port,
        metrics_port = config.metrics_port,
        flush_interval_ms = config.flush_interval_ms,
        delay_between_actions_ms = config.delay_between_actions_ms,
        "starting reward-keeper"
    );

    // --- Tracker ---
    let exec = Arc::new(DryRunExecutor::from_config(&config));
    let tracker = Arc::new(RewardTracker::new(
        config.tracker_config(),
        Executors {
            swap: exec.clone(),
            transfer: exec.clone(),
            decimals: exec,
        },
    ));
    tracing::warn!("executors are in dry-run mode; no transactions will be sent");

    // --- Metrics ---
    let keeper_metrics = Arc::new(KeeperMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracker: Arc::clone(&tracker),
        metrics: Arc::clone(&keeper_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", config.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&keeper_metrics));
    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Flush scheduler ---
    let flush_loop = tokio::spawn(scheduler::run_flush_loop(
        Arc::clone(&tracker),
        Arc::clone(&keeper_metrics),
        config.flush_interval(),
    ));

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    flush_loop.abort();

    // The ledger is memory-only. Whatever is still pending is gone.
    let pending = tracker.positive_entries();
    if !pending.is_empty() {
        tracing::warn!(
            entries = pending.len(),
            "discarding pending reward balances; ledger state is not persisted"
        );
        for (key, amount) in &pending {
            tracing::warn!(%key, %amount, "discarded pending balance");
        }
    }

    tracing::info!("reward-keeper stopped");
    Ok(())
}

/// Loads a config file, validates it, and prints the resolved JSON.
fn check_config(args: cli::CheckConfigArgs) -> Result<()> {
    let config = KeeperConfig::load(&args.config)?;
    let rendered =
        serde_json::to_string_pretty(&config).context("failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("reward-keeper {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
