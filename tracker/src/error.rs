//! Error type for a single dispatch attempt.
//!
//! Every way one ledger entry can fail to flush ends up as a
//! [`DispatchError`] inside that entry's
//! [`EntryOutcome`](crate::report::EntryOutcome). None of these ever escape
//! [`RewardTracker::flush_all`](crate::tracker::RewardTracker::flush_all).

use thiserror::Error;

use crate::executor::{HandlerError, LookupError};
use crate::key::KeyError;
use crate::ledger::LedgerError;
use crate::wad::WadError;

/// Why one ledger entry was not dispatched (or not fully booked).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The stored key could not be decoded. Only possible if something other
    /// than the codec wrote into the ledger.
    #[error("corrupted ledger key: {0}")]
    Decode(#[from] KeyError),

    /// The swap or transfer primitive failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The token's decimals could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The wad amount could not be expressed in the token's native units.
    #[error("amount conversion failed: {0}")]
    Conversion(#[from] WadError),

    /// The action executed but the ledger could not be debited afterwards.
    /// The balance is still on the books and will be dispatched again.
    #[error("dispatched but ledger debit failed: {0}")]
    Ledger(#[from] LedgerError),
}

impl DispatchError {
    /// Short machine-friendly label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Handler(_) => "handler",
            Self::Lookup(_) => "lookup",
            Self::Conversion(_) => "conversion",
            Self::Ledger(_) => "ledger",
        }
    }
}
