// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Reward Tracker — Core Library
//!
//! Keeper bots collect fees and rewards in many different tokens, one small
//! amount at a time. Acting on each of those immediately would burn more gas
//! than the rewards are worth, so this crate accumulates them and acts in
//! batches.
//!
//! Every reward is booked against a `(disposition policy, token)` bucket.
//! A policy says what to do with the bucket once it is flushed: swap it into
//! the base asset on the market maker, or send it somewhere.
//!
//! ## Architecture
//!
//! - **policy** — Disposition policies, token IDs, fee tiers.
//! - **key** — Canonical, order-independent ledger keys.
//! - **wad** — Signed 18-decimal fixed-point amounts.
//! - **ledger** — In-memory signed balances per key.
//! - **executor** — Traits the host implements for swaps, transfers, decimals.
//! - **tracker** — The flush loop that routes balances to executors.
//! - **report** — Per-entry outcomes of a flush.
//! - **config** — Constants and the tracker's runtime settings.
//!
//! ## Ground Rules
//!
//! 1. Amounts are exact integers. No floats touch a balance.
//! 2. One entry failing never stops the others from flushing.
//! 3. Nothing is persisted. A restart forgets every pending balance.
//! 4. Dispatch is sequential. The inter-action delay is the rate limit.

pub mod config;
pub mod error;
pub mod executor;
pub mod key;
pub mod ledger;
pub mod policy;
pub mod report;
pub mod tracker;
pub mod wad;

pub use config::TrackerConfig;
pub use error::DispatchError;
pub use executor::{
    DecimalsLookup, HandlerError, LookupError, SwapExecutor, SwapOverrides, TransferExecutor,
};
pub use key::{CanonicalKey, KeyError, LedgerKey};
pub use ledger::{BalanceLedger, LedgerError};
pub use policy::{DispositionPolicy, FeeTier, TokenId};
pub use report::{EntryOutcome, FlushReport, OutcomeStatus};
pub use tracker::{Executors, RewardTracker};
pub use wad::{SignedWad, WadError};
