//! # Ledger Key Codec
//!
//! Turns a `(token, policy)` pair into the string the ledger is indexed by,
//! and back again.
//!
//! The canonical form is a compact JSON object holding the policy's fields
//! plus a `token` field, with field names sorted lexicographically:
//!
//! ```text
//! {"action":"exchange","fee":3000,"token":"0xTOKEN"}
//! {"action":"transfer","to":"0xABC","token":"0xTOKEN"}
//! ```
//!
//! Sorting only canonicalizes the top level. A nested object would keep
//! whatever order its producer used, so nested values are rejected in both
//! directions instead of being half-canonicalized.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::policy::{DispositionPolicy, TokenId};

/// Field name the token is stored under inside a canonical key.
pub const TOKEN_FIELD: &str = "token";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from encoding or decoding a ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key text is not a JSON object.
    #[error("malformed ledger key {key:?}: {reason}")]
    Malformed {
        /// The offending key text.
        key: String,
        /// Parser message.
        reason: String,
    },

    /// The key has no `token` field.
    #[error("ledger key {0:?} has no token field")]
    MissingToken(String),

    /// The `token` field exists but is not a string.
    #[error("ledger key {0:?} has a non-string token field")]
    TokenNotString(String),

    /// A field holds an object or array.
    #[error("field {field:?} is nested; ledger keys must be flat")]
    Nested {
        /// Name of the nested field.
        field: String,
    },

    /// A policy declared a field that collides with the token field.
    #[error("policy field {0:?} is reserved for the token")]
    ReservedField(String),

    /// The non-token fields do not describe a known policy.
    #[error("unknown disposition policy in ledger key {key:?}: {reason}")]
    UnknownPolicy {
        /// The offending key text.
        key: String,
        /// Deserializer message.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// CanonicalKey
// ---------------------------------------------------------------------------

/// The serialized form of a [`LedgerKey`]. This is what the ledger stores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Wraps key text without validating it. Decoding will catch garbage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the `(token, policy)` pair this key was encoded from.
    pub fn decode(&self) -> Result<LedgerKey, KeyError> {
        let value: Value = serde_json::from_str(&self.0).map_err(|e| KeyError::Malformed {
            key: self.0.clone(),
            reason: e.to_string(),
        })?;

        let Value::Object(mut fields) = value else {
            return Err(KeyError::Malformed {
                key: self.0.clone(),
                reason: "expected a JSON object".to_string(),
            });
        };

        if let Some((field, _)) = fields.iter().find(|(_, v)| v.is_object() || v.is_array()) {
            return Err(KeyError::Nested {
                field: field.clone(),
            });
        }

        let token = match fields.remove(TOKEN_FIELD) {
            Some(Value::String(token)) => TokenId::new(token),
            Some(_) => return Err(KeyError::TokenNotString(self.0.clone())),
            None => return Err(KeyError::MissingToken(self.0.clone())),
        };

        let policy = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            KeyError::UnknownPolicy {
                key: self.0.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(LedgerKey { token, policy })
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// LedgerKey
// ---------------------------------------------------------------------------

/// One accumulation bucket: a token under a disposition policy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub token: TokenId,
    pub policy: DispositionPolicy,
}

impl LedgerKey {
    pub fn new(policy: DispositionPolicy, token: TokenId) -> Self {
        Self { token, policy }
    }

    /// Serializes this pair into its canonical, order-independent form.
    pub fn encode(&self) -> Result<CanonicalKey, KeyError> {
        let value = serde_json::to_value(&self.policy).map_err(|e| KeyError::Malformed {
            key: self.policy.to_string(),
            reason: e.to_string(),
        })?;
        let Value::Object(fields) = value else {
            return Err(KeyError::Malformed {
                key: self.policy.to_string(),
                reason: "policy did not serialize to an object".to_string(),
            });
        };

        let mut flat: BTreeMap<String, Value> = BTreeMap::new();
        for (name, value) in fields {
            if name == TOKEN_FIELD {
                return Err(KeyError::ReservedField(name));
            }
            if value.is_object() || value.is_array() {
                return Err(KeyError::Nested { field: name });
            }
            flat.insert(name, value);
        }
        flat.insert(
            TOKEN_FIELD.to_string(),
            Value::String(self.token.as_str().to_string()),
        );

        // BTreeMap iterates in key order, so the output is sorted no matter
        // how serde_json's own Map is configured.
        serde_json::to_string(&flat)
            .map(CanonicalKey)
            .map_err(|e| KeyError::Malformed {
                key: self.policy.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenId {
        TokenId::new("0xTOKEN")
    }

    #[test]
    fn encode_sorts_fields() {
        let key = LedgerKey::new(DispositionPolicy::exchange(3000), token())
            .encode()
            .unwrap();
        assert_eq!(
            key.as_str(),
            r#"{"action":"exchange","fee":3000,"token":"0xTOKEN"}"#
        );

        let key = LedgerKey::new(DispositionPolicy::transfer("0xABC"), token())
            .encode()
            .unwrap();
        assert_eq!(
            key.as_str(),
            r#"{"action":"transfer","to":"0xABC","token":"0xTOKEN"}"#
        );
    }

    #[test]
    fn encode_is_deterministic() {
        let a = LedgerKey::new(DispositionPolicy::transfer("0xABC"), token());
        let b = LedgerKey::new(DispositionPolicy::transfer("0xABC"), token());
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn policies_parsed_in_any_field_order_encode_identically() {
        let p1: DispositionPolicy =
            serde_json::from_str(r#"{"fee":500,"action":"exchange"}"#).unwrap();
        let p2: DispositionPolicy =
            serde_json::from_str(r#"{"action":"exchange","fee":500}"#).unwrap();
        assert_eq!(
            LedgerKey::new(p1, token()).encode().unwrap(),
            LedgerKey::new(p2, token()).encode().unwrap()
        );
    }

    #[test]
    fn distinct_pairs_get_distinct_keys() {
        let a = LedgerKey::new(DispositionPolicy::exchange(500), token()).encode().unwrap();
        let b = LedgerKey::new(DispositionPolicy::exchange(3000), token()).encode().unwrap();
        let c = LedgerKey::new(DispositionPolicy::exchange(500), TokenId::new("0xOTHER"))
            .encode()
            .unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn decode_inverts_encode() {
        for policy in [
            DispositionPolicy::exchange(10_000),
            DispositionPolicy::transfer("0xDEST"),
        ] {
            let key = LedgerKey::new(policy, token());
            assert_eq!(key.encode().unwrap().decode().unwrap(), key);
        }
    }

    #[test]
    fn decode_accepts_unsorted_input() {
        let raw = CanonicalKey::from_raw(r#"{"token":"0xT","to":"0xD","action":"transfer"}"#);
        let key = raw.decode().unwrap();
        assert_eq!(key.token, TokenId::new("0xT"));
        assert_eq!(key.policy, DispositionPolicy::transfer("0xD"));
    }

    #[test]
    fn decode_missing_token_fails() {
        let raw = CanonicalKey::from_raw(r#"{"action":"exchange","fee":3000}"#);
        assert!(matches!(raw.decode(), Err(KeyError::MissingToken(_))));
    }

    #[test]
    fn decode_non_string_token_fails() {
        let raw = CanonicalKey::from_raw(r#"{"action":"exchange","fee":3000,"token":42}"#);
        assert!(matches!(raw.decode(), Err(KeyError::TokenNotString(_))));
    }

    #[test]
    fn decode_rejects_nested_fields() {
        let raw = CanonicalKey::from_raw(
            r#"{"action":"exchange","fee":{"tier":3000},"token":"0xT"}"#,
        );
        assert_eq!(
            raw.decode(),
            Err(KeyError::Nested {
                field: "fee".to_string()
            })
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            CanonicalKey::from_raw("not json").decode(),
            Err(KeyError::Malformed { .. })
        ));
        assert!(matches!(
            CanonicalKey::from_raw("[1,2]").decode(),
            Err(KeyError::Malformed { .. })
        ));
    }

    #[test]
    fn decode_unknown_action_fails() {
        let raw = CanonicalKey::from_raw(r#"{"action":"burn","token":"0xT"}"#);
        assert!(matches!(raw.decode(), Err(KeyError::UnknownPolicy { .. })));
    }
}
