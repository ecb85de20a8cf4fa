//! Actions — the closed set of operations that get hashed, signed and
//! submitted to the exchange endpoint.
//!
//! Every variant carries exactly the fields of its wire schema, serialized
//! with a leading `"type"` tag. Each variant is paired with its signing
//! metadata in [`Action::signing_scheme`]: L1 actions are signed through the
//! phantom agent, user-signed actions are signed as EIP-712 messages with the
//! field list and primary type listed here.

pub mod codec;
pub mod wire;

pub use codec::ActionCodec;
pub use wire::{
    BuilderInfo, CancelByCloidWire, CancelWire, Grouping, LimitWire, ModifyWire, OrderRef,
    OrderTypeWire, Tif, Tpsl, TriggerWire, TwapWire, WireOrder,
};

use serde::Serialize;

use crate::network::Network;
use crate::signing::eip712::Eip712Field;

// ─── Action ──────────────────────────────────────────────────────────────────

/// A venue operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "order")]
    Order(OrderAction),
    #[serde(rename = "cancel")]
    Cancel(CancelAction),
    #[serde(rename = "cancelByCloid")]
    CancelByCloid(CancelByCloidAction),
    #[serde(rename = "modify")]
    Modify(ModifyWire),
    #[serde(rename = "batchModify")]
    BatchModify(BatchModifyAction),
    #[serde(rename = "scheduleCancel")]
    ScheduleCancel(ScheduleCancelAction),
    #[serde(rename = "updateLeverage")]
    UpdateLeverage(UpdateLeverageAction),
    #[serde(rename = "updateIsolatedMargin")]
    UpdateIsolatedMargin(UpdateIsolatedMarginAction),
    #[serde(rename = "twapOrder")]
    TwapOrder(TwapOrderAction),
    #[serde(rename = "twapCancel")]
    TwapCancel(TwapCancelAction),
    #[serde(rename = "vaultTransfer")]
    VaultTransfer(VaultTransferAction),
    #[serde(rename = "createSubAccount")]
    CreateSubAccount(CreateSubAccountAction),
    #[serde(rename = "subAccountTransfer")]
    SubAccountTransfer(SubAccountTransferAction),
    #[serde(rename = "setReferrer")]
    SetReferrer(SetReferrerAction),

    // User-signed
    #[serde(rename = "usdSend")]
    UsdSend(UsdSendAction),
    #[serde(rename = "spotSend")]
    SpotSend(SpotSendAction),
    #[serde(rename = "withdraw3")]
    Withdraw(WithdrawAction),
    #[serde(rename = "usdClassTransfer")]
    UsdClassTransfer(UsdClassTransferAction),
    #[serde(rename = "approveAgent")]
    ApproveAgent(ApproveAgentAction),
    #[serde(rename = "approveBuilderFee")]
    ApproveBuilderFee(ApproveBuilderFeeAction),
    #[serde(rename = "tokenDelegate")]
    TokenDelegate(TokenDelegateAction),
    #[serde(rename = "cDeposit")]
    CDeposit(StakingTransferAction),
    #[serde(rename = "cWithdraw")]
    CWithdraw(StakingTransferAction),
}

// ─── L1 action payloads ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAction {
    pub orders: Vec<WireOrder>,
    pub grouping: Grouping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelAction {
    pub cancels: Vec<CancelWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelByCloidAction {
    pub cancels: Vec<CancelByCloidWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchModifyAction {
    pub modifies: Vec<ModifyWire>,
}

/// Dead man's switch. `time: None` clears a scheduled cancel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleCancelAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateLeverageAction {
    pub asset: u32,
    #[serde(rename = "isCross")]
    pub is_cross: bool,
    pub leverage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateIsolatedMarginAction {
    pub asset: u32,
    #[serde(rename = "isBuy")]
    pub is_buy: bool,
    /// Signed USD amount in micro-units.
    pub ntli: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwapOrderAction {
    pub twap: TwapWire,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwapCancelAction {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "t")]
    pub twap_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultTransferAction {
    #[serde(rename = "vaultAddress")]
    pub vault_address: String,
    #[serde(rename = "isDeposit")]
    pub is_deposit: bool,
    pub usd: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubAccountAction {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubAccountTransferAction {
    #[serde(rename = "subAccountUser")]
    pub sub_account_user: String,
    #[serde(rename = "isDeposit")]
    pub is_deposit: bool,
    pub usd: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetReferrerAction {
    pub code: String,
}

// ─── User-signed action payloads ─────────────────────────────────────────────
//
// `signature_chain_id` and `hyperliquid_chain` are filled in by
// `Action::for_network` before signing; constructors leave them empty.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsdSendAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub destination: String,
    pub amount: String,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotSendAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub destination: String,
    pub token: String,
    pub amount: String,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub destination: String,
    pub amount: String,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsdClassTransferAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub amount: String,
    #[serde(rename = "toPerp")]
    pub to_perp: bool,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproveAgentAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    #[serde(rename = "agentAddress")]
    pub agent_address: String,
    #[serde(rename = "agentName")]
    pub agent_name: String,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproveBuilderFeeAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    #[serde(rename = "maxFeeRate")]
    pub max_fee_rate: String,
    pub builder: String,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenDelegateAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub validator: String,
    pub wei: u64,
    #[serde(rename = "isUndelegate")]
    pub is_undelegate: bool,
    pub nonce: u64,
}

/// Staking deposit (`cDeposit`) or withdrawal (`cWithdraw`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakingTransferAction {
    #[serde(rename = "signatureChainId")]
    pub signature_chain_id: String,
    #[serde(rename = "hyperliquidChain")]
    pub hyperliquid_chain: String,
    pub wei: u64,
    pub nonce: u64,
}

// ─── Signing metadata ────────────────────────────────────────────────────────

/// How an action is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    /// Hash the action, sign the phantom agent under the `Exchange` domain.
    L1,
    /// Sign the action itself under the `HyperliquidSignTransaction` domain.
    UserSigned {
        primary_type: &'static str,
        fields: &'static [Eip712Field],
    },
}

const fn field(name: &'static str, ty: &'static str) -> Eip712Field {
    Eip712Field { name, ty }
}

pub const USD_SEND_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("destination", "string"),
    field("amount", "string"),
    field("time", "uint64"),
];

pub const SPOT_SEND_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("destination", "string"),
    field("token", "string"),
    field("amount", "string"),
    field("time", "uint64"),
];

pub const WITHDRAW_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("destination", "string"),
    field("amount", "string"),
    field("time", "uint64"),
];

pub const USD_CLASS_TRANSFER_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("amount", "string"),
    field("toPerp", "bool"),
    field("nonce", "uint64"),
];

pub const APPROVE_AGENT_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("agentAddress", "address"),
    field("agentName", "string"),
    field("nonce", "uint64"),
];

pub const APPROVE_BUILDER_FEE_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("maxFeeRate", "string"),
    field("builder", "address"),
    field("nonce", "uint64"),
];

pub const TOKEN_DELEGATE_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("validator", "address"),
    field("wei", "uint64"),
    field("isUndelegate", "bool"),
    field("nonce", "uint64"),
];

pub const STAKING_TRANSFER_TYPES: &[Eip712Field] = &[
    field("hyperliquidChain", "string"),
    field("wei", "uint64"),
    field("nonce", "uint64"),
];

impl Action {
    /// The wire `type` tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Action::Order(_) => "order",
            Action::Cancel(_) => "cancel",
            Action::CancelByCloid(_) => "cancelByCloid",
            Action::Modify(_) => "modify",
            Action::BatchModify(_) => "batchModify",
            Action::ScheduleCancel(_) => "scheduleCancel",
            Action::UpdateLeverage(_) => "updateLeverage",
            Action::UpdateIsolatedMargin(_) => "updateIsolatedMargin",
            Action::TwapOrder(_) => "twapOrder",
            Action::TwapCancel(_) => "twapCancel",
            Action::VaultTransfer(_) => "vaultTransfer",
            Action::CreateSubAccount(_) => "createSubAccount",
            Action::SubAccountTransfer(_) => "subAccountTransfer",
            Action::SetReferrer(_) => "setReferrer",
            Action::UsdSend(_) => "usdSend",
            Action::SpotSend(_) => "spotSend",
            Action::Withdraw(_) => "withdraw3",
            Action::UsdClassTransfer(_) => "usdClassTransfer",
            Action::ApproveAgent(_) => "approveAgent",
            Action::ApproveBuilderFee(_) => "approveBuilderFee",
            Action::TokenDelegate(_) => "tokenDelegate",
            Action::CDeposit(_) => "cDeposit",
            Action::CWithdraw(_) => "cWithdraw",
        }
    }

    /// Signing scheme, primary type and ordered EIP-712 fields of this kind.
    pub fn signing_scheme(&self) -> SigningScheme {
        let user_signed = |primary_type, fields| SigningScheme::UserSigned {
            primary_type,
            fields,
        };
        match self {
            Action::UsdSend(_) => user_signed("HyperliquidTransaction:UsdSend", USD_SEND_TYPES),
            Action::SpotSend(_) => {
                user_signed("HyperliquidTransaction:SpotSend", SPOT_SEND_TYPES)
            }
            Action::Withdraw(_) => {
                user_signed("HyperliquidTransaction:Withdraw", WITHDRAW_TYPES)
            }
            Action::UsdClassTransfer(_) => user_signed(
                "HyperliquidTransaction:UsdClassTransfer",
                USD_CLASS_TRANSFER_TYPES,
            ),
            Action::ApproveAgent(_) => {
                user_signed("HyperliquidTransaction:ApproveAgent", APPROVE_AGENT_TYPES)
            }
            Action::ApproveBuilderFee(_) => user_signed(
                "HyperliquidTransaction:ApproveBuilderFee",
                APPROVE_BUILDER_FEE_TYPES,
            ),
            Action::TokenDelegate(_) => {
                user_signed("HyperliquidTransaction:TokenDelegate", TOKEN_DELEGATE_TYPES)
            }
            Action::CDeposit(_) => {
                user_signed("HyperliquidTransaction:CDeposit", STAKING_TRANSFER_TYPES)
            }
            Action::CWithdraw(_) => {
                user_signed("HyperliquidTransaction:CWithdraw", STAKING_TRANSFER_TYPES)
            }
            _ => SigningScheme::L1,
        }
    }

    pub fn is_user_signed(&self) -> bool {
        matches!(self.signing_scheme(), SigningScheme::UserSigned { .. })
    }

    /// Inject `hyperliquidChain` / `signatureChainId` for user-signed kinds.
    /// L1 actions are returned unchanged.
    pub fn for_network(mut self, network: Network) -> Self {
        if let Some((signature_chain_id, hyperliquid_chain)) = self.chain_fields_mut() {
            *signature_chain_id = network.signature_chain_id().to_string();
            *hyperliquid_chain = network.hyperliquid_chain().to_string();
        }
        self
    }

    fn chain_fields_mut(&mut self) -> Option<(&mut String, &mut String)> {
        match self {
            Action::UsdSend(a) => Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain)),
            Action::SpotSend(a) => Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain)),
            Action::Withdraw(a) => Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain)),
            Action::UsdClassTransfer(a) => {
                Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain))
            }
            Action::ApproveAgent(a) => Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain)),
            Action::ApproveBuilderFee(a) => {
                Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain))
            }
            Action::TokenDelegate(a) => {
                Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain))
            }
            Action::CDeposit(a) | Action::CWithdraw(a) => {
                Some((&mut a.signature_chain_id, &mut a.hyperliquid_chain))
            }
            _ => None,
        }
    }

    /// Request weight of this action against the REST rate limit.
    pub fn weight(&self) -> u32 {
        let batch_len = match self {
            Action::Order(a) => a.orders.len(),
            Action::Cancel(a) => a.cancels.len(),
            Action::CancelByCloid(a) => a.cancels.len(),
            Action::BatchModify(a) => a.modifies.len(),
            _ => 1,
        };
        crate::rate_limit::exchange_weight(batch_len)
    }
}
