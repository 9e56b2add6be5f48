//! # Flush Reports
//!
//! A flush never fails as a whole; individual entries do. Each entry's
//! outcome is captured as a value so callers can log, count, or alert on
//! failures without the dispatcher having to throw anything.

use chrono::{DateTime, Utc};

use crate::error::DispatchError;
use crate::key::{CanonicalKey, LedgerKey};
use crate::wad::SignedWad;

/// How one entry fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Action executed and the ledger was debited by the snapshotted amount.
    Dispatched,
    /// Entry left as-is (or, for [`DispatchError::Ledger`], executed but not booked).
    Failed(DispatchError),
}

/// Result of dispatching one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Key as stored in the ledger.
    pub key: CanonicalKey,
    /// Decoded pair; `None` if the key itself was corrupted.
    pub target: Option<LedgerKey>,
    /// Amount taken from the snapshot.
    pub amount: SignedWad,
    pub status: OutcomeStatus,
}

impl EntryOutcome {
    pub fn dispatched(key: CanonicalKey, target: LedgerKey, amount: SignedWad) -> Self {
        Self {
            key,
            target: Some(target),
            amount,
            status: OutcomeStatus::Dispatched,
        }
    }

    pub fn failed(
        key: CanonicalKey,
        target: Option<LedgerKey>,
        amount: SignedWad,
        error: DispatchError,
    ) -> Self {
        Self {
            key,
            target,
            amount,
            status: OutcomeStatus::Failed(error),
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self.status, OutcomeStatus::Dispatched)
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match &self.status {
            OutcomeStatus::Dispatched => None,
            OutcomeStatus::Failed(e) => Some(e),
        }
    }
}

/// Everything one flush cycle did, in dispatch order.
#[derive(Debug, Clone)]
pub struct FlushReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<EntryOutcome>,
}

impl FlushReport {
    /// Number of entries dispatched successfully.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_dispatched()).count()
    }

    /// Number of entries that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// `true` when every visited entry was dispatched (vacuously for an empty flush).
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    /// Entries that failed, in dispatch order.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_dispatched())
    }

    /// Outcome for a specific key, if it was part of this flush.
    pub fn outcome_for(&self, key: &CanonicalKey) -> Option<&EntryOutcome> {
        self.outcomes.iter().find(|o| &o.key == key)
    }

    /// Wall-clock time the flush took.
    pub fn elapsed(&self) -> std::time::Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::HandlerError;
    use crate::policy::{DispositionPolicy, TokenId};

    fn target() -> LedgerKey {
        LedgerKey::new(DispositionPolicy::exchange(3000), TokenId::new("0xT"))
    }

    #[test]
    fn counts_successes_and_failures() {
        let key = target().encode().unwrap();
        let now = Utc::now();
        let report = FlushReport {
            started_at: now,
            finished_at: now,
            outcomes: vec![
                EntryOutcome::dispatched(key.clone(), target(), SignedWad::from_units(1)),
                EntryOutcome::failed(
                    CanonicalKey::from_raw("bad"),
                    None,
                    SignedWad::from_units(2),
                    DispatchError::Handler(HandlerError::Swap("reverted".into())),
                ),
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.failures().count(), 1);
        assert!(report.outcome_for(&key).unwrap().is_dispatched());
        assert_eq!(
            report.outcome_for(&CanonicalKey::from_raw("bad")).unwrap().error().map(|e| e.kind()),
            Some("handler")
        );
    }

    #[test]
    fn empty_report_is_clean() {
        let now = Utc::now();
        let report = FlushReport {
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        };
        assert!(report.is_clean());
        assert_eq!(report.elapsed(), std::time::Duration::ZERO);
    }
}
