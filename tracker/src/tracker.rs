//! # Reward Tracker
//!
//! Ties the ledger to the executors. Producers call
//! [`credit`](RewardTracker::credit) whenever a reward lands; a scheduler
//! calls [`flush_all`](RewardTracker::flush_all) periodically to act on
//! everything that has piled up.
//!
//! ## Flush Cycle
//!
//! ```text
//! 1. SNAPSHOT  — copy every entry with a positive balance
//! 2. DECODE    — recover (policy, token) from each key
//! 3. ROUTE     — exchange → swap executor, transfer → decimals + transfer executor
//! 4. BOOK      — on success, debit the *snapshotted* amount, then sleep
//! 5. REPORT    — one EntryOutcome per snapshotted entry
//! ```
//!
//! Entries are dispatched one at a time, and the inter-action delay only
//! rate-limits anything because of that. Do not fan this loop out.
//!
//! ## Concurrency
//!
//! The ledger sits behind a `parking_lot::Mutex` that is only ever held for
//! a single synchronous ledger call, never across an `.await`. Credits may
//! therefore land while a flush is in flight. They are not part of the
//! running flush's snapshot and get picked up next cycle. A debit always
//! subtracts the snapshotted amount, so a late credit to the same key
//! survives the debit intact.
//!
//! A `tokio::sync::Mutex` gate serializes whole flush cycles, so two
//! schedulers (say, the timer and a manual trigger) never interleave
//! dispatches.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::error::DispatchError;
use crate::executor::{DecimalsLookup, SwapExecutor, TransferExecutor};
use crate::key::{CanonicalKey, LedgerKey};
use crate::ledger::{BalanceLedger, LedgerError};
use crate::policy::{DispositionPolicy, FeeTier, TokenId};
use crate::report::{EntryOutcome, FlushReport};
use crate::wad::SignedWad;

/// The three collaborators a tracker dispatches through.
#[derive(Clone)]
pub struct Executors {
    pub swap: Arc<dyn SwapExecutor>,
    pub transfer: Arc<dyn TransferExecutor>,
    pub decimals: Arc<dyn DecimalsLookup>,
}

/// Accumulates rewards per `(policy, token)` and flushes them through the
/// configured executors.
pub struct RewardTracker {
    ledger: Mutex<BalanceLedger>,
    executors: Executors,
    config: TrackerConfig,
    flush_gate: tokio::sync::Mutex<()>,
}

impl RewardTracker {
    pub fn new(config: TrackerConfig, executors: Executors) -> Self {
        Self {
            ledger: Mutex::new(BalanceLedger::new()),
            executors,
            config,
            flush_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // -- Ledger access -------------------------------------------------------

    /// Records a collected reward. Returns the bucket's new balance.
    pub fn credit(
        &self,
        policy: &DispositionPolicy,
        token: &TokenId,
        amount: SignedWad,
    ) -> Result<SignedWad, LedgerError> {
        let balance = self.ledger.lock().credit(policy, token, amount)?;
        debug!(%policy, %token, %amount, %balance, "reward credited");
        Ok(balance)
    }

    /// Removes `amount` from a bucket. The balance may go negative.
    pub fn debit(
        &self,
        policy: &DispositionPolicy,
        token: &TokenId,
        amount: SignedWad,
    ) -> Result<SignedWad, LedgerError> {
        let balance = self.ledger.lock().debit(policy, token, amount)?;
        debug!(%policy, %token, %amount, %balance, "reward debited");
        Ok(balance)
    }

    pub fn balance(
        &self,
        policy: &DispositionPolicy,
        token: &TokenId,
    ) -> Result<SignedWad, LedgerError> {
        self.ledger.lock().balance(policy, token)
    }

    /// Snapshot of the entries the next flush would visit.
    pub fn positive_entries(&self) -> Vec<(CanonicalKey, SignedWad)> {
        self.ledger.lock().positive_entries()
    }

    /// Snapshot of every entry, including drained and negative ones.
    pub fn entries(&self) -> Vec<(CanonicalKey, SignedWad)> {
        self.ledger.lock().entries()
    }

    // -- Flush ---------------------------------------------------------------

    /// Dispatches every positive balance once, sequentially.
    ///
    /// Never fails. Per-entry failures are logged and returned in the report;
    /// the affected balances stay on the books for the next cycle.
    pub async fn flush_all(&self) -> FlushReport {
        let _gate = self.flush_gate.lock().await;

        let started_at = Utc::now();
        let snapshot = self.positive_entries();
        debug!(entries = snapshot.len(), "flush started");

        let mut outcomes = Vec::with_capacity(snapshot.len());
        for (key, amount) in snapshot {
            outcomes.push(self.dispatch_entry(key, amount).await);
        }

        let report = FlushReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        if !report.outcomes.is_empty() {
            info!(
                dispatched = report.succeeded(),
                failed = report.failed(),
                elapsed_ms = report.elapsed().as_millis() as u64,
                "flush finished"
            );
        }
        report
    }

    async fn dispatch_entry(&self, key: CanonicalKey, amount: SignedWad) -> EntryOutcome {
        let target = match key.decode() {
            Ok(target) => target,
            Err(e) => {
                error!(%key, %amount, error = %e, "skipping ledger entry with corrupted key");
                return EntryOutcome::failed(key, None, amount, e.into());
            }
        };

        let LedgerKey { token, policy } = &target;
        let result = match policy {
            DispositionPolicy::Exchange { fee } => self.exchange(token, amount, *fee).await,
            DispositionPolicy::Transfer { destination } => {
                self.transfer(token, destination, amount).await
            }
        };

        if let Err(e) = result {
            error!(
                action = policy.tag(),
                %policy,
                %token,
                %amount,
                error = %e,
                "failed to dispatch reward, balance kept for next flush"
            );
            return EntryOutcome::failed(key, Some(target), amount, e);
        }

        // Debit what was dispatched, not whatever the balance is now.
        let booked = self.ledger.lock().debit(policy, token, amount);
        self.pause().await;

        match booked {
            Ok(_) => EntryOutcome::dispatched(key, target, amount),
            Err(e) => {
                warn!(
                    %policy,
                    %token,
                    %amount,
                    error = %e,
                    "reward dispatched but ledger not debited; it will be dispatched again"
                );
                EntryOutcome::failed(key, Some(target), amount, e.into())
            }
        }
    }

    async fn exchange(
        &self,
        token: &TokenId,
        amount: SignedWad,
        fee: FeeTier,
    ) -> Result<(), DispatchError> {
        self.executors
            .swap
            .swap(token, amount, fee, &self.config.swap_overrides)
            .await?;
        info!(
            %token,
            fee_pct = fee.as_percent(),
            %amount,
            "exchanged reward token on market maker"
        );
        Ok(())
    }

    async fn transfer(
        &self,
        token: &TokenId,
        destination: &str,
        amount: SignedWad,
    ) -> Result<(), DispatchError> {
        debug!(%token, destination, %amount, "sending reward token");
        let decimals = self.executors.decimals.decimals(token).await?;
        let native = amount.to_native(decimals)?;
        self.executors
            .transfer
            .transfer(token, destination, native)
            .await?;
        info!(%token, destination, %amount, native, decimals, "transferred reward token");
        Ok(())
    }

    async fn pause(&self) {
        let delay = self.config.delay_between_actions;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::executor::{HandlerError, LookupError, SwapOverrides};
    use crate::report::OutcomeStatus;

    struct AlwaysOk;

    #[async_trait]
    impl SwapExecutor for AlwaysOk {
        async fn swap(
            &self,
            _token: &TokenId,
            _amount_wad: SignedWad,
            _fee: FeeTier,
            _overrides: &SwapOverrides,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[async_trait]
    impl TransferExecutor for AlwaysOk {
        async fn transfer(
            &self,
            _token: &TokenId,
            _destination: &str,
            _amount_native: u128,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DecimalsLookup for AlwaysOk {
        async fn decimals(&self, _token: &TokenId) -> Result<u8, LookupError> {
            Ok(18)
        }
    }

    fn tracker() -> RewardTracker {
        let ok = Arc::new(AlwaysOk);
        RewardTracker::new(
            TrackerConfig::without_delay(),
            Executors {
                swap: ok.clone(),
                transfer: ok.clone(),
                decimals: ok,
            },
        )
    }

    #[tokio::test]
    async fn corrupted_key_is_skipped_without_aborting_flush() {
        let tracker = tracker();
        let policy = DispositionPolicy::exchange(3000);
        let token = TokenId::new("0xT");
        tracker.credit(&policy, &token, SignedWad::from_units(5)).unwrap();

        let corrupted = CanonicalKey::from_raw(r#"{"action":"exchange","fee":3000}"#);
        tracker
            .ledger
            .lock()
            .insert_raw(corrupted.clone(), SignedWad::from_units(9));

        let report = tracker.flush_all().await;

        assert_eq!(report.outcomes.len(), 2);
        let bad = report.outcome_for(&corrupted).unwrap();
        assert!(bad.target.is_none());
        assert!(matches!(
            bad.status,
            OutcomeStatus::Failed(DispatchError::Decode(_))
        ));
        assert_eq!(tracker.balance(&policy, &token).unwrap(), SignedWad::ZERO);
        // Corrupted entry untouched.
        assert!(tracker
            .positive_entries()
            .contains(&(corrupted, SignedWad::from_units(9))));
    }

    #[tokio::test]
    async fn empty_ledger_flush_is_clean() {
        let report = tracker().flush_all().await;
        assert!(report.outcomes.is_empty());
        assert!(report.is_clean());
    }
}
