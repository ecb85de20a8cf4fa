//! Exchange sub-client — sign and submit actions.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::action::{
    Action, ApproveAgentAction, CancelAction, CancelByCloidAction, Grouping, OrderAction,
    UpdateLeverageAction, UsdSendAction, WithdrawAction,
};
use crate::client::AuthenticatedClient;
use crate::domain::exchange::{CancelByCloidRequest, CancelRequest, OrderRequest};
use crate::error::SdkError;
use crate::shared::{address_to_wire, decimal_to_wire};
use crate::signing::SignedEnvelope;

/// Sub-client for signed exchange actions.
pub struct Exchange<'a> {
    pub(crate) client: &'a AuthenticatedClient,
}

impl<'a> Exchange<'a> {
    /// Sign `action` with a fresh nonce and POST it to `/exchange`.
    pub async fn submit(&self, action: Action) -> Result<Value, SdkError> {
        let nonce = self.client.nonces.next();
        self.submit_with_nonce(action, nonce).await
    }

    /// Sign and submit over a connected router instead of REST.
    #[cfg(feature = "ws-native")]
    pub async fn submit_ws(
        &self,
        router: &crate::ws::router::SubscriptionRouter,
        action: Action,
        timeout: std::time::Duration,
    ) -> Result<Value, SdkError> {
        let envelope = self.sign(action, self.client.nonces.next())?;
        let payload = serde_json::to_value(&envelope)?;
        router
            .post_request(crate::ws::PostKind::Action, payload, timeout)
            .await
    }

    /// Sign without submitting.
    pub fn sign(&self, action: Action, nonce: u64) -> Result<SignedEnvelope, SdkError> {
        // User-signed actions are never submitted on behalf of a vault.
        let vault = if action.is_user_signed() {
            None
        } else {
            self.client.vault_address
        };
        self.client.signer.sign_action(action, nonce, vault)
    }

    async fn submit_with_nonce(&self, action: Action, nonce: u64) -> Result<Value, SdkError> {
        let weight = action.weight();
        let envelope = self.sign(action, nonce)?;
        self.client
            .inner
            .http
            .post_exchange(&envelope, weight)
            .await
    }

    // ── Trading ──────────────────────────────────────────────────────────

    pub async fn place_order(&self, order: OrderRequest) -> Result<Value, SdkError> {
        self.place_orders(vec![order], Grouping::Na).await
    }

    pub async fn place_orders(
        &self,
        orders: Vec<OrderRequest>,
        grouping: Grouping,
    ) -> Result<Value, SdkError> {
        let registry = self.client.inner.symbols();
        let orders = orders
            .iter()
            .map(|order| order.to_wire(registry))
            .collect::<Result<Vec<_>, _>>()?;
        self.submit(Action::Order(OrderAction {
            orders,
            grouping,
            builder: None,
        }))
        .await
    }

    pub async fn cancel(&self, coin: &str, oid: u64) -> Result<Value, SdkError> {
        let cancel = CancelRequest {
            coin: coin.to_string(),
            oid,
        }
        .to_wire(self.client.inner.symbols())?;
        self.submit(Action::Cancel(CancelAction {
            cancels: vec![cancel],
        }))
        .await
    }

    pub async fn cancel_by_cloid(&self, request: CancelByCloidRequest) -> Result<Value, SdkError> {
        let cancel = request.to_wire(self.client.inner.symbols())?;
        self.submit(Action::CancelByCloid(CancelByCloidAction {
            cancels: vec![cancel],
        }))
        .await
    }

    pub async fn update_leverage(
        &self,
        coin: &str,
        leverage: u32,
        is_cross: bool,
    ) -> Result<Value, SdkError> {
        let asset = self.client.inner.symbols().resolve_asset(coin)?;
        self.submit(Action::UpdateLeverage(UpdateLeverageAction {
            asset,
            is_cross,
            leverage,
        }))
        .await
    }

    // ── Transfers ────────────────────────────────────────────────────────

    /// Send USDC to another address on the exchange.
    pub async fn usd_send(&self, destination: Address, amount: Decimal) -> Result<Value, SdkError> {
        let nonce = self.client.nonces.next();
        let action = Action::UsdSend(UsdSendAction {
            signature_chain_id: String::new(),
            hyperliquid_chain: String::new(),
            destination: address_to_wire(&destination),
            amount: decimal_to_wire(amount),
            time: nonce,
        });
        self.submit_with_nonce(action, nonce).await
    }

    /// Withdraw USDC to the bridge destination.
    pub async fn withdraw(&self, destination: Address, amount: Decimal) -> Result<Value, SdkError> {
        let nonce = self.client.nonces.next();
        let action = Action::Withdraw(WithdrawAction {
            signature_chain_id: String::new(),
            hyperliquid_chain: String::new(),
            destination: address_to_wire(&destination),
            amount: decimal_to_wire(amount),
            time: nonce,
        });
        self.submit_with_nonce(action, nonce).await
    }

    /// Authorize `agent` to sign L1 actions for this account.
    pub async fn approve_agent(
        &self,
        agent: Address,
        name: Option<&str>,
    ) -> Result<Value, SdkError> {
        let nonce = self.client.nonces.next();
        let action = Action::ApproveAgent(ApproveAgentAction {
            signature_chain_id: String::new(),
            hyperliquid_chain: String::new(),
            agent_address: address_to_wire(&agent),
            agent_name: name.unwrap_or_default().to_string(),
            nonce,
        });
        self.submit_with_nonce(action, nonce).await
    }
}
