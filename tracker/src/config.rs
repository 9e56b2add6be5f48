//! # Tracker Configuration & Constants
//!
//! Every magic number the tracker depends on lives here. The wad scale in
//! particular must never be spelled as a bare `10^18` literal anywhere else;
//! use [`WAD`] or [`WAD_DECIMALS`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::executor::SwapOverrides;

// ---------------------------------------------------------------------------
// Fixed-point Convention
// ---------------------------------------------------------------------------

/// Number of decimal places in a wad. Every reward amount inside the ledger
/// is denominated in this scale, regardless of the token's native decimals.
pub const WAD_DECIMALS: u32 = 18;

/// One whole unit expressed in wad (`10^18`).
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// Largest native decimal count we are willing to rescale into. ERC-20
/// tokens in the wild stay at or below 18; anything past this is treated
/// as a broken `decimals()` response.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

// ---------------------------------------------------------------------------
// Market Maker
// ---------------------------------------------------------------------------

/// Divisor that turns a pool fee tier into a percentage for display.
/// A fee tier of 3000 is a 0.3% pool.
pub const FEE_TIER_PERCENT_DIVISOR: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Default pause after each successful dispatch. Keeps the outbound
/// request rate bounded when a flush drains many entries.
pub const DEFAULT_DELAY_BETWEEN_ACTIONS: Duration = Duration::from_millis(1_000);

/// Default period between scheduled flush cycles.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// TrackerConfig
// ---------------------------------------------------------------------------

/// The slice of keeper configuration the tracker itself reads.
///
/// Loading this from disk is the host's job; the tracker only consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Sleep applied after every successful dispatch within a flush.
    #[serde(with = "duration_millis")]
    pub delay_between_actions: Duration,

    /// Transaction overrides forwarded verbatim to every swap.
    #[serde(default)]
    pub swap_overrides: SwapOverrides,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            delay_between_actions: DEFAULT_DELAY_BETWEEN_ACTIONS,
            swap_overrides: SwapOverrides::default(),
        }
    }
}

impl TrackerConfig {
    /// Config with no inter-action delay. Handy for tests and one-shot tools.
    pub fn without_delay() -> Self {
        Self {
            delay_between_actions: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds.
pub mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_matches_decimals() {
        assert_eq!(WAD, 10i128.pow(WAD_DECIMALS));
    }

    #[test]
    fn test_timing_constants_sanity() {
        // A delay longer than the flush period would starve the scheduler.
        assert!(DEFAULT_DELAY_BETWEEN_ACTIONS < DEFAULT_FLUSH_INTERVAL);
    }

    #[test]
    fn test_config_json_uses_millis() {
        let config = TrackerConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["delay_between_actions"], 1_000);

        let parsed: TrackerConfig =
            serde_json::from_str(r#"{ "delay_between_actions": 250 }"#).unwrap();
        assert_eq!(parsed.delay_between_actions, Duration::from_millis(250));
        assert_eq!(parsed.swap_overrides, SwapOverrides::default());
    }

    #[test]
    fn test_without_delay() {
        assert_eq!(TrackerConfig::without_delay().delay_between_actions, Duration::ZERO);
    }
}
