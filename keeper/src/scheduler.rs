//! Periodic flush driver.
//!
//! One loop, one tracker. The tracker itself guarantees that a manual
//! `/flush` request and a scheduled tick never dispatch concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::warn;

use reward_tracker::{FlushReport, RewardTracker};

use crate::metrics::SharedMetrics;

/// Runs `flush_all` every `interval`, forever. The first flush happens one
/// full interval after start, giving producers time to credit something.
pub async fn run_flush_loop(
    tracker: Arc<RewardTracker>,
    metrics: SharedMetrics,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    // A slow flush should push the schedule back, not trigger a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let report = flush_and_record(&tracker, &metrics).await;
        if !report.is_clean() {
            warn!(
                failed = report.failed(),
                "flush cycle left balances pending after failures"
            );
        }
    }
}

/// Runs one flush and folds its report into the metrics.
pub async fn flush_and_record(tracker: &RewardTracker, metrics: &SharedMetrics) -> FlushReport {
    let report = tracker.flush_all().await;
    metrics.record_flush(&report, tracker.positive_entries().len());
    report
}
