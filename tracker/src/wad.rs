//! # Signed Wad Arithmetic
//!
//! Reward amounts are tracked as signed fixed-point integers scaled by
//! [`WAD`] (`10^18`). A balance can dip below zero when a debit outruns the
//! credits that preceded it, so the representation is signed.
//!
//! `i128` holds ±1.7·10^38 wei, i.e. roughly 1.7·10^20 whole tokens per
//! ledger entry. All arithmetic is checked; nothing here ever wraps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{MAX_TOKEN_DECIMALS, WAD, WAD_DECIMALS};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing or rescaling wad amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WadError {
    /// Input text was not a valid amount.
    #[error("invalid amount {input:?}: {reason}")]
    Parse {
        /// The rejected text.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The result does not fit in the backing integer.
    #[error("amount overflow")]
    Overflow,

    /// Native token amounts are unsigned; a negative wad has no native form.
    #[error("cannot convert negative amount {0} to native units")]
    Negative(SignedWad),

    /// The token reported a decimal count we refuse to scale into.
    #[error("token decimals {0} exceed the supported maximum of {max}", max = MAX_TOKEN_DECIMALS)]
    UnsupportedDecimals(u8),
}

// ---------------------------------------------------------------------------
// SignedWad
// ---------------------------------------------------------------------------

/// A signed amount in wei at 18-decimal scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignedWad(i128);

impl SignedWad {
    /// The zero amount.
    pub const ZERO: SignedWad = SignedWad(0);

    /// Wraps a raw wei amount.
    pub const fn from_wei(wei: i128) -> Self {
        Self(wei)
    }

    /// Returns `whole` tokens expressed in wad.
    pub fn from_units(whole: i64) -> Self {
        Self(i128::from(whole) * WAD)
    }

    /// Raw wei value.
    pub const fn wei(self) -> i128 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: SignedWad) -> Option<SignedWad> {
        self.0.checked_add(rhs.0).map(SignedWad)
    }

    pub fn checked_sub(self, rhs: SignedWad) -> Option<SignedWad> {
        self.0.checked_sub(rhs.0).map(SignedWad)
    }

    /// Rescales this wad amount into a token's native decimal representation.
    ///
    /// Shrinking (fewer than 18 decimals) truncates toward zero, so dust
    /// below the token's smallest unit is never sent. Growing (more than 18
    /// decimals) is exact or fails with [`WadError::Overflow`].
    pub fn to_native(self, decimals: u8) -> Result<u128, WadError> {
        if self.0 < 0 {
            return Err(WadError::Negative(self));
        }
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(WadError::UnsupportedDecimals(decimals));
        }

        let wei = self.0.unsigned_abs();
        let decimals = u32::from(decimals);
        if decimals <= WAD_DECIMALS {
            Ok(wei / 10u128.pow(WAD_DECIMALS - decimals))
        } else {
            10u128
                .checked_pow(decimals - WAD_DECIMALS)
                .and_then(|scale| wei.checked_mul(scale))
                .ok_or(WadError::Overflow)
        }
    }

    /// Parses an integer wei string such as `"1500000000000000000"`.
    pub fn from_wei_str(s: &str) -> Result<Self, WadError> {
        s.trim()
            .parse::<i128>()
            .map(SignedWad)
            .map_err(|_| WadError::Parse {
                input: s.to_string(),
                reason: "expected an integer wei amount",
            })
    }
}

/// Renders the human-readable decimal form: `1.5`, `-0.000001`, `200`.
impl fmt::Display for SignedWad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = WAD.unsigned_abs();
        let abs = self.0.unsigned_abs();
        let whole = abs / scale;
        let frac = abs % scale;

        if self.0 < 0 {
            write!(f, "-")?;
        }
        if frac == 0 {
            return write!(f, "{}", whole);
        }

        let digits = format!("{:0width$}", frac, width = WAD_DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Parses a decimal token amount such as `"12.5"` into wad.
impl FromStr for SignedWad {
    type Err = WadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason| WadError::Parse {
            input: s.to_string(),
            reason,
        };

        let text = s.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(parse_err("empty amount"));
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(parse_err("expected decimal digits"));
        }
        if frac.len() > WAD_DECIMALS as usize {
            return Err(parse_err("more than 18 fractional digits"));
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| WadError::Overflow)?
        };
        let frac: i128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = WAD_DECIMALS as usize);
            padded.parse().map_err(|_| parse_err("expected decimal digits"))?
        };

        let wei = whole
            .checked_mul(WAD)
            .and_then(|w| w.checked_add(frac))
            .ok_or(WadError::Overflow)?;

        Ok(SignedWad(if negative { -wei } else { wei }))
    }
}

// Wire form is the integer wei string. JSON numbers lose precision past 2^53.
impl Serialize for SignedWad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SignedWad {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SignedWad::from_wei_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_decimal_form() {
        assert_eq!(SignedWad::from_units(200).to_string(), "200");
        assert_eq!(SignedWad::from_wei(WAD + WAD / 2).to_string(), "1.5");
        assert_eq!(SignedWad::from_wei(-1_000_000_000_000).to_string(), "-0.000001");
        assert_eq!(SignedWad::from_wei(1).to_string(), "0.000000000000000001");
        assert_eq!(SignedWad::ZERO.to_string(), "0");
    }

    #[test]
    fn parse_decimal_amounts() {
        assert_eq!("1.5".parse::<SignedWad>().unwrap().wei(), WAD + WAD / 2);
        assert_eq!("100".parse::<SignedWad>().unwrap(), SignedWad::from_units(100));
        assert_eq!(".25".parse::<SignedWad>().unwrap().wei(), WAD / 4);
        assert_eq!("-2".parse::<SignedWad>().unwrap(), SignedWad::from_units(-2));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<SignedWad>().is_err());
        assert!("1.2.3".parse::<SignedWad>().is_err());
        assert!("abc".parse::<SignedWad>().is_err());
        assert!("0.0000000000000000001".parse::<SignedWad>().is_err());
    }

    #[test]
    fn parse_overflow_detected() {
        let huge = "9".repeat(40);
        assert_eq!(huge.parse::<SignedWad>(), Err(WadError::Overflow));
    }

    #[test]
    fn to_native_shrinks_with_truncation() {
        // 1.2345678 tokens at 6 decimals keeps only 1.234567.
        let amount: SignedWad = "1.2345678".parse().unwrap();
        assert_eq!(amount.to_native(6).unwrap(), 1_234_567);
        assert_eq!(amount.to_native(18).unwrap(), amount.wei() as u128);
        assert_eq!(SignedWad::from_units(3).to_native(0).unwrap(), 3);
    }

    #[test]
    fn to_native_grows_exactly() {
        assert_eq!(
            SignedWad::from_units(1).to_native(24).unwrap(),
            10u128.pow(24)
        );
    }

    #[test]
    fn to_native_rejects_negative_and_bad_decimals() {
        assert!(matches!(
            SignedWad::from_units(-1).to_native(6),
            Err(WadError::Negative(_))
        ));
        assert_eq!(
            SignedWad::from_units(1).to_native(MAX_TOKEN_DECIMALS + 1),
            Err(WadError::UnsupportedDecimals(MAX_TOKEN_DECIMALS + 1))
        );
    }

    #[test]
    fn to_native_overflow_detected() {
        let big = SignedWad::from_wei(i128::MAX);
        assert_eq!(big.to_native(MAX_TOKEN_DECIMALS), Err(WadError::Overflow));
    }

    #[test]
    fn checked_ops_do_not_wrap() {
        let max = SignedWad::from_wei(i128::MAX);
        assert_eq!(max.checked_add(SignedWad::from_wei(1)), None);
        assert_eq!(
            SignedWad::ZERO.checked_sub(SignedWad::from_units(5)),
            Some(SignedWad::from_units(-5))
        );
    }

    #[test]
    fn serde_uses_wei_strings() {
        let amount = SignedWad::from_units(2);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"2000000000000000000\"");
        let back: SignedWad = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<SignedWad>("\"1.5\"").is_err());
    }
}
