//! Shared newtypes and utilities used across all modules.
//!
//! These types are serialization-transparent: they serialize/deserialize
//! identically to the raw format the venue sends, so they can be used directly
//! in wire types without conversion overhead.

pub mod decimal;

pub use decimal::{decimal_to_wire, float_to_wire, normalize_decimal_str};

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::str::FromStr;

use crate::error::SdkError;

// ─── Hashing ─────────────────────────────────────────────────────────────────

/// Keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let digest = Keccak256::new().chain_update(data.as_ref()).finalize();
    B256::from_slice(&digest)
}

// ─── Addresses ───────────────────────────────────────────────────────────────

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_address(s: &str) -> Result<Address, SdkError> {
    Address::from_str(s.trim())
        .map_err(|e| SdkError::validation(format!("invalid address `{}`: {}", s, e)))
}

/// Lowercase `0x`-prefixed rendering, the form the venue expects on the wire.
pub fn address_to_wire(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

// ─── Cloid ───────────────────────────────────────────────────────────────────

/// Client order id: `0x` followed by 32 hex characters (16 bytes).
///
/// Opaque to this crate beyond the format check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cloid(String);

impl Cloid {
    pub fn new(s: &str) -> Result<Self, SdkError> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| SdkError::validation(format!("cloid `{}` must start with 0x", s)))?;
        if hex_part.len() != 32 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SdkError::validation(format!(
                "cloid `{}` must be 16 bytes of hex",
                s
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(format!("0x{:032x}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cloid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cloid {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cloid::new(s)
    }
}

impl Serialize for Cloid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cloid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cloid::new(&s).map_err(serde::de::Error::custom)
    }
}

// ─── MarketClass ─────────────────────────────────────────────────────────────

/// Perpetual or spot market; selects the canonical internal-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketClass {
    Perp,
    Spot,
}

impl MarketClass {
    pub fn suffix(&self) -> &'static str {
        match self {
            MarketClass::Perp => "-PERP",
            MarketClass::Spot => "-SPOT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256([])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_cloid_validation() {
        assert!(Cloid::new("0x00000000000000000000000000000001").is_ok());
        assert!(Cloid::new("00000000000000000000000000000001").is_err());
        assert!(Cloid::new("0x1234").is_err());
        assert!(Cloid::new("0xzz000000000000000000000000000001").is_err());
    }

    #[test]
    fn test_cloid_from_u128() {
        assert_eq!(
            Cloid::from_u128(255).as_str(),
            "0x000000000000000000000000000000ff"
        );
    }

    #[test]
    fn test_address_to_wire_is_lowercase() {
        let addr = parse_address("0xAbCdEf0000000000000000000000000000000001").unwrap();
        assert_eq!(
            address_to_wire(&addr),
            "0xabcdef0000000000000000000000000000000001"
        );
    }
}
