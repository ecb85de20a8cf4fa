//! EIP-712 typed data.
//!
//! The L1 phantom agent is a `sol!` struct. User-signed primary types carry a
//! `HyperliquidTransaction:` prefix, which is not a Solidity identifier, and
//! their message is the action JSON itself, so those are hashed from static
//! `(name, type)` tables over a `serde_json::Value`. Only flat structs of
//! atomic types are supported there.

use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::Eip712Domain;
use serde_json::Value;

use crate::error::SdkError;
use crate::shared::keccak256;

/// One member of a typed-data struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712Field {
    pub name: &'static str,
    pub ty: &'static str,
}

alloy::sol! {
    /// Phantom agent signed for L1 actions. `source` is `"a"` on mainnet and
    /// `"b"` on testnet; `connectionId` is the action hash.
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}

/// `Primary(type1 name1,type2 name2,...)`.
pub fn encode_type(primary_type: &str, fields: &[Eip712Field]) -> String {
    let members: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.ty, f.name))
        .collect();
    format!("{}({})", primary_type, members.join(","))
}

pub fn type_hash(primary_type: &str, fields: &[Eip712Field]) -> B256 {
    keccak256(encode_type(primary_type, fields))
}

/// `keccak(typeHash || enc(field_1) || ... || enc(field_n))`.
pub fn struct_hash(
    primary_type: &str,
    fields: &[Eip712Field],
    message: &Value,
) -> Result<B256, SdkError> {
    let object = message
        .as_object()
        .ok_or_else(|| SdkError::validation("typed-data message must be a JSON object"))?;

    let mut buf = Vec::with_capacity(32 * (fields.len() + 1));
    buf.extend_from_slice(type_hash(primary_type, fields).as_slice());
    for field in fields {
        let value = object.get(field.name).ok_or_else(|| {
            SdkError::validation(format!(
                "{} is missing field `{}`",
                primary_type, field.name
            ))
        })?;
        let word = encode_value(field, value)?;
        buf.extend_from_slice(word.as_slice());
    }
    Ok(keccak256(buf))
}

/// `keccak(0x1901 || domainSeparator || structHash)`.
pub fn signing_hash(domain: &Eip712Domain, struct_hash: B256) -> B256 {
    let mut buf = Vec::with_capacity(66);
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(domain.separator().as_slice());
    buf.extend_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

fn encode_value(field: &Eip712Field, value: &Value) -> Result<B256, SdkError> {
    let mismatch = || {
        SdkError::validation(format!(
            "field `{}` does not hold a valid {}",
            field.name, field.ty
        ))
    };

    match field.ty {
        "string" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => {
            let bytes = decode_hex(value.as_str().ok_or_else(mismatch)?).ok_or_else(mismatch)?;
            Ok(keccak256(bytes))
        }
        "bool" => {
            let b = value.as_bool().ok_or_else(mismatch)?;
            Ok(B256::from(U256::from(b as u8).to_be_bytes::<32>()))
        }
        "address" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let address = Address::from_str(s).map_err(|_| mismatch())?;
            Ok(address.into_word())
        }
        "bytes32" => {
            let bytes = decode_hex(value.as_str().ok_or_else(mismatch)?).ok_or_else(mismatch)?;
            if bytes.len() != 32 {
                return Err(mismatch());
            }
            Ok(B256::from_slice(&bytes))
        }
        ty if ty.starts_with("uint") => {
            let bits: usize = ty["uint".len()..].parse().map_err(|_| {
                SdkError::validation(format!("unsupported EIP-712 type `{}`", ty))
            })?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(SdkError::validation(format!(
                    "unsupported EIP-712 type `{}`",
                    ty
                )));
            }
            let n = match value {
                Value::Number(n) => U256::from(n.as_u64().ok_or_else(mismatch)?),
                Value::String(s) => U256::from_str(s).map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            if n.bit_len() > bits {
                return Err(mismatch());
            }
            Ok(B256::from(n.to_be_bytes::<32>()))
        }
        other => Err(SdkError::validation(format!(
            "unsupported EIP-712 type `{}`",
            other
        ))),
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolStruct;
    use serde_json::json;

    const AGENT_FIELDS: &[Eip712Field] = &[
        Eip712Field {
            name: "source",
            ty: "string",
        },
        Eip712Field {
            name: "connectionId",
            ty: "bytes32",
        },
    ];

    #[test]
    fn test_encode_type_matches_sol_struct() {
        assert_eq!(encode_type("Agent", AGENT_FIELDS), Agent::eip712_encode_type());
        assert_eq!(
            encode_type("Agent", AGENT_FIELDS),
            "Agent(string source,bytes32 connectionId)"
        );
    }

    #[test]
    fn test_table_hash_matches_sol_struct() {
        let agent = Agent {
            source: "b".to_string(),
            connectionId: B256::repeat_byte(0x42),
        };
        let message = json!({
            "source": "b",
            "connectionId": format!("0x{}", hex::encode(agent.connectionId)),
        });
        let table = struct_hash("Agent", AGENT_FIELDS, &message).unwrap();
        assert_eq!(table, agent.eip712_hash_struct());

        let domain = Eip712Domain::default();
        assert_eq!(signing_hash(&domain, table), agent.eip712_signing_hash(&domain));
    }

    #[test]
    fn test_encode_type_keeps_prefixed_name() {
        let fields = [
            Eip712Field {
                name: "hyperliquidChain",
                ty: "string",
            },
            Eip712Field {
                name: "time",
                ty: "uint64",
            },
        ];
        assert_eq!(
            encode_type("HyperliquidTransaction:UsdSend", &fields),
            "HyperliquidTransaction:UsdSend(string hyperliquidChain,uint64 time)"
        );
    }

    #[test]
    fn test_struct_hash_layout() {
        let connection_id = B256::repeat_byte(0x11);
        let message = json!({"source": "a", "connectionId": format!("0x{}", hex::encode(connection_id))});
        let hash = struct_hash("Agent", AGENT_FIELDS, &message).unwrap();

        let mut buf = Vec::new();
        buf.extend_from_slice(type_hash("Agent", AGENT_FIELDS).as_slice());
        buf.extend_from_slice(keccak256(b"a").as_slice());
        buf.extend_from_slice(connection_id.as_slice());
        assert_eq!(hash, keccak256(buf));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let message = json!({"source": "a"});
        let err = struct_hash("Agent", AGENT_FIELDS, &message).unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
    }

    #[test]
    fn test_type_mismatch_is_validation_error() {
        let fields = [Eip712Field {
            name: "flag",
            ty: "bool",
        }];
        assert!(struct_hash("T", &fields, &json!({"flag": "yes"})).is_err());

        let fields = [Eip712Field {
            name: "n",
            ty: "uint8",
        }];
        assert!(struct_hash("T", &fields, &json!({"n": 256})).is_err());
        assert!(struct_hash("T", &fields, &json!({"n": 255})).is_ok());

        let fields = [Eip712Field {
            name: "x",
            ty: "int64",
        }];
        assert!(struct_hash("T", &fields, &json!({"x": 1})).is_err());
    }

    #[test]
    fn test_uint_accepts_number_and_decimal_string() {
        let fields = [Eip712Field {
            name: "n",
            ty: "uint64",
        }];
        assert_eq!(
            struct_hash("T", &fields, &json!({"n": 1000})).unwrap(),
            struct_hash("T", &fields, &json!({"n": "1000"})).unwrap()
        );
    }

    #[test]
    fn test_address_is_left_padded() {
        let fields = [Eip712Field {
            name: "who",
            ty: "address",
        }];
        let address = Address::repeat_byte(0x22);
        let hash = struct_hash("T", &fields, &json!({"who": address.to_string()})).unwrap();

        let mut buf = Vec::new();
        buf.extend_from_slice(type_hash("T", &fields).as_slice());
        buf.extend_from_slice(&[0u8; 12]);
        buf.extend_from_slice(address.as_slice());
        assert_eq!(hash, keccak256(buf));
    }
}
