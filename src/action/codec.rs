//! Canonical action bytes and the L1 action hash.
//!
//! Layout: `msgpack(normalized action) || nonce (u64 BE) || 0x00` without a
//! vault, or `|| 0x01 || vault (20 bytes)` with one. The Keccak-256 of that
//! buffer is the `connectionId` of the phantom agent.

use alloy::primitives::{Address, B256};
use serde_json::Value;

use super::Action;
use crate::error::SdkError;
use crate::shared::{keccak256, normalize_decimal_str};

/// Keys whose string values are prices or sizes.
const DECIMAL_KEYS: &[&str] = &["p", "s", "px", "sz", "limitPx", "triggerPx"];

/// Stateless encoder for action hashes.
pub struct ActionCodec;

impl ActionCodec {
    /// The action as the JSON value that is both hashed and sent.
    pub fn to_value(action: &Action) -> Result<Value, SdkError> {
        let mut value = serde_json::to_value(action)?;
        Self::normalize(&mut value)?;
        Ok(value)
    }

    /// Rewrite every price/size string in place to its canonical form.
    /// Numbers and all other fields are left alone.
    pub fn normalize(value: &mut Value) -> Result<(), SdkError> {
        match value {
            Value::Object(map) => {
                for (key, entry) in map.iter_mut() {
                    match entry {
                        Value::String(s) if DECIMAL_KEYS.contains(&key.as_str()) => {
                            *s = normalize_decimal_str(s)?;
                        }
                        _ => Self::normalize(entry)?,
                    }
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(Self::normalize),
            _ => Ok(()),
        }
    }

    pub fn encode(action: &Action, nonce: u64, vault: Option<Address>) -> Result<Vec<u8>, SdkError> {
        let value = serde_json::to_value(action)?;
        Self::encode_value(&value, nonce, vault)
    }

    pub fn hash(action: &Action, nonce: u64, vault: Option<Address>) -> Result<B256, SdkError> {
        Ok(keccak256(Self::encode(action, nonce, vault)?))
    }

    /// Encode a raw JSON action, e.g. a kind [`Action`] does not model.
    /// Object keys keep their insertion order.
    pub fn encode_value(
        action: &Value,
        nonce: u64,
        vault: Option<Address>,
    ) -> Result<Vec<u8>, SdkError> {
        let mut normalized = action.clone();
        Self::normalize(&mut normalized)?;

        let mut buf = rmp_serde::to_vec_named(&normalized)?;
        buf.extend_from_slice(&nonce.to_be_bytes());
        match vault {
            Some(address) => {
                buf.push(1);
                buf.extend_from_slice(address.as_slice());
            }
            None => buf.push(0),
        }
        Ok(buf)
    }

    pub fn hash_value(action: &Value, nonce: u64, vault: Option<Address>) -> Result<B256, SdkError> {
        Ok(keccak256(Self::encode_value(action, nonce, vault)?))
    }
}
