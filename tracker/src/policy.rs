//! # Disposition Policies
//!
//! A disposition policy says what happens to a reward once it has been
//! accumulated: swap it into the base asset on the market maker, or send it
//! to a fixed address. Policies are plain, flat records. Every field is a
//! scalar so that the key codec can canonicalize them by sorting field
//! names; do not add nested fields to a variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FEE_TIER_PERCENT_DIVISOR;

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Opaque token identifier, normally a chain address such as `0xA0b8...`.
///
/// The tracker never interprets it. Two spellings of the same address
/// (checksummed vs lowercase) are two different tokens as far as the ledger
/// is concerned, so producers should normalize before crediting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// FeeTier
// ---------------------------------------------------------------------------

/// Pool fee tier of the market maker, as the integer the pool is keyed by.
///
/// `500`, `3000` and `10000` are the usual tiers (0.05%, 0.3%, 1%).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTier(pub u32);

impl FeeTier {
    /// Fee as a percentage, for log output only.
    pub fn as_percent(self) -> f64 {
        f64::from(self.0) / FEE_TIER_PERCENT_DIVISOR
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

// ---------------------------------------------------------------------------
// DispositionPolicy
// ---------------------------------------------------------------------------

/// What to do with an accumulated reward balance.
///
/// Serialized flat, tagged by `action`:
///
/// ```text
/// {"action":"exchange","fee":3000}
/// {"action":"transfer","to":"0xABC"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispositionPolicy {
    /// Swap the reward into the base asset through the pool with this fee tier.
    Exchange {
        /// Fee tier selecting the pool.
        fee: FeeTier,
    },

    /// Send the reward as-is to a fixed destination address.
    Transfer {
        /// Recipient address.
        #[serde(rename = "to")]
        destination: String,
    },
}

impl DispositionPolicy {
    pub fn exchange(fee: u32) -> Self {
        Self::Exchange { fee: FeeTier(fee) }
    }

    pub fn transfer(destination: impl Into<String>) -> Self {
        Self::Transfer {
            destination: destination.into(),
        }
    }

    /// The `action` tag, also used as a metrics label.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Exchange { .. } => "exchange",
            Self::Transfer { .. } => "transfer",
        }
    }
}

impl fmt::Display for DispositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exchange { fee } => write!(f, "exchange(fee={})", fee),
            Self::Transfer { destination } => write!(f, "transfer(to={})", destination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_serializes_flat_with_action_tag() {
        let json = serde_json::to_value(DispositionPolicy::exchange(3000)).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "exchange", "fee": 3000 }));

        let json = serde_json::to_value(DispositionPolicy::transfer("0xABC")).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "transfer", "to": "0xABC" }));
    }

    #[test]
    fn policy_deserializes_regardless_of_field_order() {
        let a: DispositionPolicy =
            serde_json::from_str(r#"{"to":"0xABC","action":"transfer"}"#).unwrap();
        let b: DispositionPolicy =
            serde_json::from_str(r#"{"action":"transfer","to":"0xABC"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fee_tier_display() {
        assert_eq!(FeeTier(3000).to_string(), "0.3%");
        assert_eq!(FeeTier(10_000).to_string(), "1%");
    }

    #[test]
    fn tags() {
        assert_eq!(DispositionPolicy::exchange(500).tag(), "exchange");
        assert_eq!(DispositionPolicy::transfer("0x1").tag(), "transfer");
    }
}
