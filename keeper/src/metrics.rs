//! # Prometheus Metrics
//!
//! Exposes operational metrics for the keeper. Scraped by Prometheus at the
//! `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use reward_tracker::FlushReport;

/// Holds all Prometheus metric handles for the keeper.
#[derive(Clone)]
pub struct KeeperMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of rewards credited through the API.
    pub credits_total: IntCounter,
    /// Total number of flush cycles run (scheduled and manual).
    pub flush_cycles_total: IntCounter,
    /// Entries dispatched successfully, by action.
    pub dispatched_total: IntCounterVec,
    /// Entries that failed to dispatch, by error kind.
    pub dispatch_failures_total: IntCounterVec,
    /// Ledger entries with a positive balance after the last flush.
    pub pending_entries: IntGauge,
    /// Histogram of flush cycle duration in seconds.
    pub flush_duration_seconds: Histogram,
}

impl KeeperMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("keeper".into()), None)
            .expect("failed to create prometheus registry");

        let credits_total = IntCounter::new("credits_total", "Total number of rewards credited")
            .expect("metric creation");
        registry
            .register(Box::new(credits_total.clone()))
            .expect("metric registration");

        let flush_cycles_total =
            IntCounter::new("flush_cycles_total", "Total number of flush cycles run")
                .expect("metric creation");
        registry
            .register(Box::new(flush_cycles_total.clone()))
            .expect("metric registration");

        let dispatched_total = IntCounterVec::new(
            Opts::new("dispatched_total", "Ledger entries dispatched successfully"),
            &["action"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(dispatched_total.clone()))
            .expect("metric registration");

        let dispatch_failures_total = IntCounterVec::new(
            Opts::new(
                "dispatch_failures_total",
                "Ledger entries that failed to dispatch",
            ),
            &["kind"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(dispatch_failures_total.clone()))
            .expect("metric registration");

        let pending_entries = IntGauge::new(
            "pending_entries",
            "Ledger entries with a positive balance awaiting dispatch",
        )
        .expect("metric creation");
        registry
            .register(Box::new(pending_entries.clone()))
            .expect("metric registration");

        let flush_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "flush_duration_seconds",
                "Wall-clock duration of a flush cycle in seconds",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(flush_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            credits_total,
            flush_cycles_total,
            dispatched_total,
            dispatch_failures_total,
            pending_entries,
            flush_duration_seconds,
        }
    }

    /// Folds one flush report into the counters.
    pub fn record_flush(&self, report: &FlushReport, pending_after: usize) {
        self.flush_cycles_total.inc();
        self.flush_duration_seconds
            .observe(report.elapsed().as_secs_f64());

        for outcome in &report.outcomes {
            match outcome.error() {
                None => {
                    let action = outcome
                        .target
                        .as_ref()
                        .map(|t| t.policy.tag())
                        .unwrap_or("unknown");
                    self.dispatched_total.with_label_values(&[action]).inc();
                }
                Some(e) => {
                    self.dispatch_failures_total
                        .with_label_values(&[e.kind()])
                        .inc();
                }
            }
        }

        self.pending_entries.set(pending_after as i64);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for KeeperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<KeeperMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
