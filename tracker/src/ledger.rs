//! # Balance Ledger
//!
//! In-memory map from [`CanonicalKey`] to a [`SignedWad`] balance. Producers
//! credit it as rewards come in; the dispatcher debits it after each
//! successful action.
//!
//! Entries are created lazily on first touch and are never removed. A
//! balance that reaches zero (or goes negative) stays in the map and simply
//! stops showing up in [`BalanceLedger::positive_entries`] until it is
//! credited again. Nothing here is persisted: the ledger dies with the
//! process.

use std::collections::HashMap;

use thiserror::Error;

use crate::key::{CanonicalKey, KeyError, LedgerKey};
use crate::policy::{DispositionPolicy, TokenId};
use crate::wad::SignedWad;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while mutating the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The `(policy, token)` pair could not be canonicalized.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The new balance would not fit in a wad.
    ///
    /// Needs on the order of 10^20 whole tokens in one bucket. Either a
    /// producer is crediting in the wrong unit, or something is very wrong.
    #[error("balance overflow for {key}: current {current}, delta {delta}")]
    Overflow {
        /// Key of the entry being updated.
        key: CanonicalKey,
        /// Balance before the failed update.
        current: SignedWad,
        /// Signed amount that was being applied.
        delta: SignedWad,
    },
}

// ---------------------------------------------------------------------------
// BalanceLedger
// ---------------------------------------------------------------------------

/// Signed reward balances indexed by canonical key.
///
/// Not `Sync` by itself; [`RewardTracker`](crate::tracker::RewardTracker)
/// wraps it in a mutex.
#[derive(Clone, Debug, Default)]
pub struct BalanceLedger {
    entries: HashMap<CanonicalKey, SignedWad>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds `amount` to the `(policy, token)` bucket and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Key`] if the pair cannot be encoded,
    /// [`LedgerError::Overflow`] if the sum does not fit.
    pub fn credit(
        &mut self,
        policy: &DispositionPolicy,
        token: &TokenId,
        amount: SignedWad,
    ) -> Result<SignedWad, LedgerError> {
        let key = encode(policy, token)?;
        self.apply(key, amount, SignedWad::checked_add)
    }

    /// Subtracts `amount` from the `(policy, token)` bucket and returns the
    /// new balance. The result may be negative.
    pub fn debit(
        &mut self,
        policy: &DispositionPolicy,
        token: &TokenId,
        amount: SignedWad,
    ) -> Result<SignedWad, LedgerError> {
        let key = encode(policy, token)?;
        self.apply(key, amount, SignedWad::checked_sub)
    }

    /// Current balance of a bucket; zero if it was never touched.
    pub fn balance(
        &self,
        policy: &DispositionPolicy,
        token: &TokenId,
    ) -> Result<SignedWad, LedgerError> {
        let key = encode(policy, token)?;
        Ok(self.entries.get(&key).copied().unwrap_or(SignedWad::ZERO))
    }

    /// Snapshot of every entry with a strictly positive balance.
    ///
    /// Order is unspecified.
    pub fn positive_entries(&self) -> Vec<(CanonicalKey, SignedWad)> {
        self.entries
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(key, amount)| (key.clone(), *amount))
            .collect()
    }

    /// Snapshot of every entry, including zero and negative balances.
    pub fn entries(&self) -> Vec<(CanonicalKey, SignedWad)> {
        self.entries
            .iter()
            .map(|(key, amount)| (key.clone(), *amount))
            .collect()
    }

    /// Number of buckets ever touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(
        &mut self,
        key: CanonicalKey,
        delta: SignedWad,
        op: fn(SignedWad, SignedWad) -> Option<SignedWad>,
    ) -> Result<SignedWad, LedgerError> {
        let current = self.entries.get(&key).copied().unwrap_or(SignedWad::ZERO);
        let updated = op(current, delta).ok_or_else(|| LedgerError::Overflow {
            key: key.clone(),
            current,
            delta,
        })?;
        self.entries.insert(key, updated);
        Ok(updated)
    }

    /// Writes a raw key straight into the map, bypassing the codec.
    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, key: CanonicalKey, amount: SignedWad) {
        self.entries.insert(key, amount);
    }
}

fn encode(policy: &DispositionPolicy, token: &TokenId) -> Result<CanonicalKey, KeyError> {
    LedgerKey::new(policy.clone(), token.clone()).encode()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
