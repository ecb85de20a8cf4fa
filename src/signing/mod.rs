//! Signing — EIP-712 signatures for L1 and user-signed actions.
//!
//! Two schemes, selected per action kind by [`Action::signing_scheme`]:
//!
//! - **L1 actions** hash the action with [`ActionCodec`] and sign a phantom
//!   `Agent { source, connectionId }` under the `Exchange` domain
//!   (chain id 1337).
//! - **User-signed actions** sign the action JSON itself under the
//!   `HyperliquidSignTransaction` domain, chain id 42161 or 421614.
//!
//! Signatures are deterministic (RFC 6979): the same key, action, nonce and
//! network always produce the same `{r, s, v}`.

pub mod eip712;
pub mod nonce;

pub use eip712::{Agent, Eip712Field};
pub use nonce::NonceGenerator;

use std::borrow::Cow;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::{Eip712Domain, SolStruct as _};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::action::{Action, ActionCodec, SigningScheme};
use crate::error::SdkError;
use crate::network::Network;
use crate::shared::address_to_wire;

// ─── Domains ─────────────────────────────────────────────────────────────────

/// Chain id of the L1 action domain, on both networks.
pub const L1_CHAIN_ID: u64 = 1337;

/// `{name: "Exchange", version: "1", chainId: 1337, verifyingContract: 0x0}`.
pub fn l1_domain() -> Eip712Domain {
    Eip712Domain {
        name: Some(Cow::Borrowed("Exchange")),
        version: Some(Cow::Borrowed("1")),
        chain_id: Some(U256::from(L1_CHAIN_ID)),
        verifying_contract: Some(Address::ZERO),
        ..Eip712Domain::default()
    }
}

/// `{name: "HyperliquidSignTransaction", version: "1", chainId, verifyingContract: 0x0}`.
pub fn user_signed_domain(network: Network) -> Eip712Domain {
    Eip712Domain {
        name: Some(Cow::Borrowed("HyperliquidSignTransaction")),
        version: Some(Cow::Borrowed("1")),
        chain_id: Some(U256::from(network.user_signing_chain_id())),
        verifying_contract: Some(Address::ZERO),
        ..Eip712Domain::default()
    }
}

// ─── Signature / envelope ────────────────────────────────────────────────────

/// Recoverable secp256k1 signature. `v` is 27 or 28.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl Signature {
    fn from_alloy(sig: &alloy::primitives::Signature) -> Self {
        Self {
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
            v: 27 + sig.v() as u8,
        }
    }

    fn to_alloy(self) -> alloy::primitives::Signature {
        alloy::primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.v == 28,
        )
    }

    /// Address that produced this signature over `prehash`.
    pub fn recover(&self, prehash: B256) -> Result<Address, SdkError> {
        self.to_alloy()
            .recover_address_from_prehash(&prehash)
            .map_err(|e| SdkError::signing(format!("recovery failed: {}", e)))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Signature", 3)?;
        state.serialize_field("r", &format!("0x{}", hex::encode(self.r)))?;
        state.serialize_field("s", &format!("0x{}", hex::encode(self.s)))?;
        state.serialize_field("v", &self.v)?;
        state.end()
    }
}

/// Request body for the exchange endpoint.
///
/// `action` is the normalized JSON that was hashed, so the venue recomputes
/// the same digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedEnvelope {
    pub action: Value,
    pub nonce: u64,
    pub signature: Signature,
    #[serde(rename = "vaultAddress", skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
}

// ─── ExchangeSigner ──────────────────────────────────────────────────────────

/// Holds a private key and signs actions for one network.
#[derive(Clone)]
pub struct ExchangeSigner {
    signer: PrivateKeySigner,
    network: Network,
}

impl std::fmt::Debug for ExchangeSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeSigner")
            .field("address", &self.signer.address())
            .field("network", &self.network)
            .finish()
    }
}

impl ExchangeSigner {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_private_key(private_key: &str, network: Network) -> Result<Self, SdkError> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| SdkError::signing(format!("invalid private key: {}", e)))?;
        Ok(Self { signer, network })
    }

    pub fn from_signer(signer: PrivateKeySigner, network: Network) -> Self {
        Self { signer, network }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Scheme A: sign the phantom agent for an action hash.
    pub fn sign_l1_hash(&self, connection_id: B256) -> Result<Signature, SdkError> {
        self.sign_digest(l1_signing_hash(connection_id, self.network))
    }

    /// Scheme B: sign `message` (the action with chain fields injected) as
    /// `primary_type` over the ordered `fields`.
    pub fn sign_user_signed(
        &self,
        message: &Value,
        primary_type: &str,
        fields: &[Eip712Field],
    ) -> Result<Signature, SdkError> {
        self.sign_typed_data(
            &user_signed_domain(self.network),
            primary_type,
            fields,
            message,
        )
    }

    /// Hash and sign `action` with the scheme its kind requires.
    pub fn sign_action(
        &self,
        action: Action,
        nonce: u64,
        vault: Option<Address>,
    ) -> Result<SignedEnvelope, SdkError> {
        let action = action.for_network(self.network);
        let value = ActionCodec::to_value(&action)?;

        let signature = match action.signing_scheme() {
            SigningScheme::L1 => self.sign_l1_hash(ActionCodec::hash_value(&value, nonce, vault)?)?,
            SigningScheme::UserSigned {
                primary_type,
                fields,
            } => self.sign_user_signed(&value, primary_type, fields)?,
        };

        tracing::debug!(
            "Signed {} action with nonce {} for {}",
            action.type_tag(),
            nonce,
            self.network
        );

        Ok(SignedEnvelope {
            action: value,
            nonce,
            signature,
            vault_address: vault.as_ref().map(address_to_wire),
        })
    }

    /// Sign a raw L1 action JSON, for kinds [`Action`] does not model.
    pub fn sign_l1_value(
        &self,
        action: &Value,
        nonce: u64,
        vault: Option<Address>,
    ) -> Result<SignedEnvelope, SdkError> {
        let mut value = action.clone();
        ActionCodec::normalize(&mut value)?;
        let signature = self.sign_l1_hash(ActionCodec::hash_value(&value, nonce, vault)?)?;
        Ok(SignedEnvelope {
            action: value,
            nonce,
            signature,
            vault_address: vault.as_ref().map(address_to_wire),
        })
    }

    fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        primary_type: &str,
        fields: &[Eip712Field],
        message: &Value,
    ) -> Result<Signature, SdkError> {
        let struct_hash = eip712::struct_hash(primary_type, fields, message)?;
        self.sign_digest(eip712::signing_hash(domain, struct_hash))
    }

    fn sign_digest(&self, digest: B256) -> Result<Signature, SdkError> {
        let sig = self
            .signer
            .sign_hash_sync(&digest)
            .map_err(|e| SdkError::signing(e.to_string()))?;
        Ok(Signature::from_alloy(&sig))
    }
}

/// EIP-712 digest an L1 signature is made over. Useful for verification.
pub fn l1_signing_hash(connection_id: B256, network: Network) -> B256 {
    let agent = Agent {
        source: network.agent_source().to_string(),
        connectionId: connection_id,
    };
    agent.eip712_signing_hash(&l1_domain())
}

/// EIP-712 digest a user-signed signature is made over.
pub fn user_signed_signing_hash(
    message: &Value,
    primary_type: &str,
    fields: &[Eip712Field],
    network: Network,
) -> Result<B256, SdkError> {
    let struct_hash = eip712::struct_hash(primary_type, fields, message)?;
    Ok(eip712::signing_hash(&user_signed_domain(network), struct_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{
        CancelAction, CancelWire, UsdSendAction, WithdrawAction, USD_SEND_TYPES,
    };
    use serde_json::json;

    const KEY: &str = "0x0123456789012345678901234567890123456789012345678901234567890123";

    fn signer(network: Network) -> ExchangeSigner {
        ExchangeSigner::from_private_key(KEY, network).unwrap()
    }

    fn cancel() -> Action {
        Action::Cancel(CancelAction {
            cancels: vec![CancelWire { asset: 1, oid: 82 }],
        })
    }

    fn usd_send(time: u64) -> Action {
        Action::UsdSend(UsdSendAction {
            signature_chain_id: String::new(),
            hyperliquid_chain: String::new(),
            destination: "0x5e9ee1089755c3435139848e47e6635505d5a13a".into(),
            amount: "1".into(),
            time,
        })
    }

    #[test]
    fn test_invalid_key_is_signing_error() {
        let err = ExchangeSigner::from_private_key("not a key", Network::Mainnet).unwrap_err();
        assert!(matches!(err, SdkError::Signing(_)));
    }

    #[test]
    fn test_l1_signature_recovers_signer() {
        let signer = signer(Network::Mainnet);
        let envelope = signer.sign_action(cancel(), 1_700_000_000_000, None).unwrap();

        let hash = ActionCodec::hash(&cancel(), 1_700_000_000_000, None).unwrap();
        let prehash = l1_signing_hash(hash, Network::Mainnet);
        assert_eq!(envelope.signature.recover(prehash).unwrap(), signer.address());
        assert!(envelope.signature.v == 27 || envelope.signature.v == 28);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = signer(Network::Mainnet);
        let a = signer.sign_action(cancel(), 5, None).unwrap();
        let b = signer.sign_action(cancel(), 5, None).unwrap();
        assert_eq!(a.signature, b.signature);

        let c = signer.sign_action(cancel(), 6, None).unwrap();
        assert_ne!(a.signature, c.signature);
    }

    #[test]
    fn test_network_changes_l1_signature() {
        let mainnet = signer(Network::Mainnet).sign_action(cancel(), 5, None).unwrap();
        let testnet = signer(Network::Testnet).sign_action(cancel(), 5, None).unwrap();
        assert_ne!(mainnet.signature, testnet.signature);
    }

    #[test]
    fn test_user_signed_recovers_signer_and_injects_chain() {
        let signer = signer(Network::Testnet);
        let envelope = signer.sign_action(usd_send(1_700_000_000_000), 1_700_000_000_000, None).unwrap();

        assert_eq!(envelope.action["hyperliquidChain"], "Testnet");
        assert_eq!(envelope.action["signatureChainId"], "0x66eee");
        assert_eq!(envelope.action["type"], "usdSend");

        let prehash = user_signed_signing_hash(
            &envelope.action,
            "HyperliquidTransaction:UsdSend",
            USD_SEND_TYPES,
            Network::Testnet,
        )
        .unwrap();
        assert_eq!(envelope.signature.recover(prehash).unwrap(), signer.address());
    }

    #[test]
    fn test_user_signed_primary_type_matters() {
        // withdraw3 and usdSend share a field list but not a primary type
        let signer = signer(Network::Mainnet);
        let send = signer.sign_action(usd_send(9), 9, None).unwrap();
        let withdrawal = signer.sign_action(withdraw(9), 9, None).unwrap();
        assert_ne!(send.signature, withdrawal.signature);
    }

    #[test]
    fn test_mismatched_field_spec_is_validation_error() {
        let signer = signer(Network::Mainnet);
        let err = signer
            .sign_user_signed(&json!({"amount": "1"}), "HyperliquidTransaction:UsdSend", USD_SEND_TYPES)
            .unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
    }

    #[test]
    fn test_envelope_serialization() {
        let vault = Address::repeat_byte(0xAB);
        let envelope = signer(Network::Mainnet).sign_action(cancel(), 7, Some(vault)).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["nonce"], 7);
        assert_eq!(json["vaultAddress"], "0xabababababababababababababababababababab");
        let r = json["signature"]["r"].as_str().unwrap();
        assert!(r.starts_with("0x") && r.len() == 66);
        assert!(json["signature"]["v"].as_u64().unwrap() >= 27);

        let no_vault = signer(Network::Mainnet).sign_action(cancel(), 7, None).unwrap();
        let json = serde_json::to_value(&no_vault).unwrap();
        assert!(json.get("vaultAddress").is_none());
    }

    fn hex_word(word: B256) -> String {
        format!("0x{}", hex::encode(word))
    }

    fn assert_word(word: B256, prefix: &str, suffix: &str) {
        let hex = hex_word(word);
        assert!(hex.starts_with(prefix) && hex.ends_with(suffix), "got {}", hex);
    }

    fn withdraw(time: u64) -> Action {
        Action::Withdraw(WithdrawAction {
            signature_chain_id: String::new(),
            hyperliquid_chain: String::new(),
            destination: "0x5e9ee1089755c3435139848e47e6635505d5a13a".into(),
            amount: "1".into(),
            time,
        })
    }

    #[test]
    fn test_l1_reference_vectors() {
        let action = json!({"type": "dummy", "num": 100_000_000_000u64});

        let mainnet = signer(Network::Mainnet).sign_l1_value(&action, 0, None).unwrap();
        assert_word(mainnet.signature.r, "0x053749d5", "59298");
        assert_eq!(mainnet.signature.v, 27);

        let testnet = signer(Network::Testnet).sign_l1_value(&action, 0, None).unwrap();
        assert_word(testnet.signature.r, "0x542af61e", "9510");
        assert_eq!(testnet.signature.v, 28);
    }

    #[test]
    fn test_user_signed_reference_vectors() {
        let time = 1_687_816_341_423;
        let signer = signer(Network::Testnet);

        let send = signer.sign_action(usd_send(time), time, None).unwrap();
        assert_word(send.signature.r, "0x637b37dd", "77073");
        assert_eq!(send.signature.v, 27);

        let withdrawal = signer.sign_action(withdraw(time), time, None).unwrap();
        assert_word(withdrawal.signature.r, "0x8363524c", "37cf9");
        assert_eq!(withdrawal.signature.v, 28);
    }

    #[test]
    fn test_agent_digest_recovers_l1_signer() {
        let signer = signer(Network::Testnet);
        let connection_id = B256::repeat_byte(0x07);
        let signature = signer.sign_l1_hash(connection_id).unwrap();
        let digest = l1_signing_hash(connection_id, Network::Testnet);
        assert_eq!(signature.recover(digest).unwrap(), signer.address());
        assert_ne!(digest, l1_signing_hash(connection_id, Network::Mainnet));
    }

    #[test]
    fn test_l1_domain_separator_differs_from_user_domain() {
        assert_ne!(
            l1_domain().separator(),
            user_signed_domain(Network::Mainnet).separator()
        );
    }
}
