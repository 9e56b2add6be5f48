//! # Dispatch Executors
//!
//! The tracker decides *what* to do with a balance; executors do it. Swap
//! routing, ERC-20 transfers, and `decimals()` calls all need a signer and a
//! chain connection, which the tracker deliberately knows nothing about.
//! Hosts implement these traits and hand them to
//! [`RewardTracker`](crate::tracker::RewardTracker).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{FeeTier, TokenId};
use crate::wad::SignedWad;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A swap or transfer primitive failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The swap could not be executed (no route, reverted, rejected by RPC...).
    #[error("swap failed: {0}")]
    Swap(String),

    /// The transfer could not be executed.
    #[error("transfer failed: {0}")]
    Transfer(String),
}

/// The token's decimal precision could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decimals lookup failed for {token}: {reason}")]
pub struct LookupError {
    pub token: TokenId,
    pub reason: String,
}

impl LookupError {
    pub fn new(token: &TokenId, reason: impl Into<String>) -> Self {
        Self {
            token: token.clone(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Swap overrides
// ---------------------------------------------------------------------------

/// Transaction-level knobs forwarded untouched to every swap.
///
/// All fields are optional; `None` lets the executor pick its own default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapOverrides {
    /// Gas limit for the swap transaction.
    pub gas_limit: Option<u64>,

    /// Max fee per gas, in wei.
    pub max_fee_per_gas: Option<u64>,

    /// Maximum tolerated slippage in basis points.
    pub slippage_bps: Option<u32>,

    /// Seconds until the swap deadline expires.
    pub deadline_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Swaps a reward token into the base asset on the market maker.
///
/// The amount is wad-denominated; converting to the token's native decimals
/// is the executor's responsibility.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn swap(
        &self,
        token: &TokenId,
        amount_wad: SignedWad,
        fee: FeeTier,
        overrides: &SwapOverrides,
    ) -> Result<(), HandlerError>;
}

/// Sends `amount_native` (already in the token's own decimals) to `destination`.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(
        &self,
        token: &TokenId,
        destination: &str,
        amount_native: u128,
    ) -> Result<(), HandlerError>;
}

/// Resolves a token's `decimals()`.
#[async_trait]
pub trait DecimalsLookup: Send + Sync {
    async fn decimals(&self, token: &TokenId) -> Result<u8, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_default_from_empty_json() {
        let overrides: SwapOverrides = serde_json::from_str("{}").unwrap();
        assert_eq!(overrides, SwapOverrides::default());
    }

    #[test]
    fn overrides_partial_json() {
        let overrides: SwapOverrides =
            serde_json::from_str(r#"{ "gas_limit": 400000, "slippage_bps": 50 }"#).unwrap();
        assert_eq!(overrides.gas_limit, Some(400_000));
        assert_eq!(overrides.slippage_bps, Some(50));
        assert_eq!(overrides.deadline_secs, None);
    }

    #[test]
    fn error_messages() {
        let err = LookupError::new(&TokenId::new("0xT"), "rpc timeout");
        assert_eq!(err.to_string(), "decimals lookup failed for 0xT: rpc timeout");
        assert_eq!(
            HandlerError::Swap("no pool".into()).to_string(),
            "swap failed: no pool"
        );
    }
}
