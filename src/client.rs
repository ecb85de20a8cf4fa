//! High-level clients — `HyperliquidClient` and `AuthenticatedClient` with
//! nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared transport/registry state, and
//! the accessor methods.

use std::sync::Arc;

use alloy::primitives::Address;

use crate::domain::exchange::client::Exchange;
use crate::domain::info::client::Info;
use crate::error::SdkError;
use crate::http::HttpTransport;
use crate::network::Network;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::signing::{ExchangeSigner, NonceGenerator};
use crate::symbols::{MetaSource, RegistryConfig, SymbolRegistry};
use crate::ws::WsConfig;

// Re-export sub-client types for convenience.
pub use crate::domain::exchange::client::Exchange as ExchangeClient;
pub use crate::domain::info::client::Info as InfoClient;

/// Unauthenticated entry point: info requests, symbols, WebSocket routers.
///
/// Cloning is cheap; clones share the HTTP transport, the rate limiter and
/// the symbol registry.
#[derive(Clone)]
pub struct HyperliquidClient {
    pub(crate) http: Arc<HttpTransport>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) registry: SymbolRegistry,
    pub(crate) network: Network,
    pub(crate) ws_config: WsConfig,
}

impl std::fmt::Debug for HyperliquidClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperliquidClient")
            .field("network", &self.network)
            .field("base_url", &self.http.base_url())
            .field("ws_url", &self.ws_config.url)
            .finish()
    }
}

impl HyperliquidClient {
    pub fn builder() -> HyperliquidClientBuilder {
        HyperliquidClientBuilder::default()
    }

    /// Load symbol metadata and start its periodic refresh.
    pub async fn initialize(&self) -> Result<(), SdkError> {
        self.registry.initialize().await
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn info(&self) -> Info<'_> {
        Info { client: self }
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Get the WS config routers are created from.
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// Create a new, unconnected router on the client's WS config.
    ///
    /// The router is not embedded in the client because socket lifetimes
    /// are managed by the application.
    #[cfg(feature = "ws-native")]
    pub fn router(&self) -> crate::ws::router::SubscriptionRouter {
        crate::ws::router::SubscriptionRouter::new(self.ws_config.clone())
    }

    /// Like [`router`](Self::router) with a caller-supplied config.
    #[cfg(feature = "ws-native")]
    pub fn router_with(&self, ws_config: WsConfig) -> crate::ws::router::SubscriptionRouter {
        crate::ws::router::SubscriptionRouter::new(ws_config)
    }

    /// Attach a signing key.
    pub fn authenticate(self, private_key: &str) -> Result<AuthenticatedClient, SdkError> {
        AuthenticatedClient::new(self, private_key)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Authenticated client
// ═════════════════════════════════════════════════════════════════════════════

/// A [`HyperliquidClient`] plus a signing key, for exchange actions.
///
/// All actions submitted through one client draw nonces from the same
/// generator, so concurrent submissions never collide.
#[derive(Clone)]
pub struct AuthenticatedClient {
    pub(crate) inner: HyperliquidClient,
    pub(crate) signer: ExchangeSigner,
    pub(crate) nonces: Arc<NonceGenerator>,
    pub(crate) vault_address: Option<Address>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("address", &self.signer.address())
            .field("network", &self.inner.network)
            .field("vault_address", &self.vault_address)
            .finish()
    }
}

impl AuthenticatedClient {
    /// Parse `private_key` (hex, `0x` optional) and sign for the client's
    /// network.
    pub fn new(client: HyperliquidClient, private_key: &str) -> Result<Self, SdkError> {
        let signer = ExchangeSigner::from_private_key(private_key, client.network)?;
        tracing::debug!("Authenticated as {}", signer.address());
        Ok(Self {
            inner: client,
            signer,
            nonces: Arc::new(NonceGenerator::new()),
            vault_address: None,
        })
    }

    /// Trade on behalf of a vault or sub-account.
    pub fn with_vault(mut self, vault_address: Address) -> Self {
        self.vault_address = Some(vault_address);
        self
    }

    pub fn exchange(&self) -> Exchange<'_> {
        Exchange { client: self }
    }

    pub fn info(&self) -> Info<'_> {
        self.inner.info()
    }

    pub fn client(&self) -> &HyperliquidClient {
        &self.inner
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn vault_address(&self) -> Option<Address> {
        self.vault_address
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct HyperliquidClientBuilder {
    network: Network,
    base_url: Option<String>,
    ws_url: Option<String>,
    rate_limit: RateLimitConfig,
    registry: RegistryConfig,
    meta_source: Option<Arc<dyn MetaSource>>,
    vault_address: Option<Address>,
}

impl HyperliquidClientBuilder {
    /// Selects default URLs and the signing chain.
    pub fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = Some(url.to_string());
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    pub fn registry(mut self, config: RegistryConfig) -> Self {
        self.registry = config;
        self
    }

    /// Load symbol metadata from `source` instead of the HTTP transport.
    pub fn meta_source(mut self, source: Arc<dyn MetaSource>) -> Self {
        self.meta_source = Some(source);
        self
    }

    /// Vault or sub-account for clients built with
    /// [`build_authenticated`](Self::build_authenticated).
    pub fn vault_address(mut self, vault_address: Address) -> Self {
        self.vault_address = Some(vault_address);
        self
    }

    /// Build and attach a signing key in one step.
    pub fn build_authenticated(self, private_key: &str) -> Result<AuthenticatedClient, SdkError> {
        let vault_address = self.vault_address;
        let mut client = self.build()?.authenticate(private_key)?;
        client.vault_address = vault_address;
        Ok(client)
    }

    pub fn build(self) -> Result<HyperliquidClient, SdkError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| self.network.api_url().to_string());
        let ws_url = self
            .ws_url
            .unwrap_or_else(|| self.network.ws_url().to_string());

        let limiter = Arc::new(RateLimiter::new(self.rate_limit)?);
        let http = Arc::new(HttpTransport::new(&base_url)?.with_throttle(limiter.clone()));
        let source = self
            .meta_source
            .unwrap_or_else(|| http.clone() as Arc<dyn MetaSource>);

        Ok(HyperliquidClient {
            http,
            limiter,
            registry: SymbolRegistry::new(source, self.registry),
            network: self.network,
            ws_config: WsConfig::new(&ws_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{TESTNET_API_URL, TESTNET_WS_URL};

    const KEY: &str = "0x0123456789012345678901234567890123456789012345678901234567890123";

    #[test]
    fn test_builder_uses_network_defaults() {
        let client = HyperliquidClient::builder()
            .network(Network::Testnet)
            .build()
            .unwrap();
        assert_eq!(client.http.base_url(), TESTNET_API_URL);
        assert_eq!(client.ws_config().url, TESTNET_WS_URL);
        assert_eq!(client.network(), Network::Testnet);
    }

    #[test]
    fn test_builder_overrides() {
        let client = HyperliquidClient::builder()
            .base_url("http://localhost:3001/")
            .ws_url("ws://localhost:3001/ws")
            .rate_limit(RateLimitConfig {
                capacity: 10,
                refill_per_sec: 1.0,
            })
            .build()
            .unwrap();
        assert_eq!(client.http.base_url(), "http://localhost:3001");
        assert_eq!(client.ws_config().url, "ws://localhost:3001/ws");
        assert_eq!(client.rate_limiter().config().capacity, 10);
    }

    #[cfg(feature = "ws-native")]
    #[test]
    fn test_router_uses_client_ws_config() {
        let client = HyperliquidClient::builder()
            .ws_url("ws://localhost:3001/ws")
            .build()
            .unwrap();
        let router = client.router();
        assert_eq!(router.transport().config().url, "ws://localhost:3001/ws");

        let other = client.router_with(WsConfig::new("ws://localhost:4000/ws"));
        assert_eq!(other.transport().config().url, "ws://localhost:4000/ws");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(HyperliquidClient::builder().base_url("localhost").build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_refill() {
        let err = HyperliquidClient::builder()
            .rate_limit(RateLimitConfig {
                capacity: 10,
                refill_per_sec: 0.0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
    }

    #[test]
    fn test_authenticate() {
        let client = HyperliquidClient::builder().build().unwrap();
        let auth = client.authenticate(KEY).unwrap();
        assert_eq!(auth.address(), auth.signer.address());
        assert!(auth.vault_address().is_none());

        let vault = Address::repeat_byte(0x11);
        let auth = auth.with_vault(vault);
        assert_eq!(auth.vault_address(), Some(vault));
    }

    #[test]
    fn test_build_authenticated_with_vault() {
        let vault = Address::repeat_byte(0x33);
        let auth = HyperliquidClient::builder()
            .network(Network::Testnet)
            .vault_address(vault)
            .build_authenticated(KEY)
            .unwrap();
        assert_eq!(auth.vault_address(), Some(vault));
        assert_eq!(auth.client().network(), Network::Testnet);
    }

    #[test]
    fn test_authenticate_rejects_bad_key() {
        let client = HyperliquidClient::builder().build().unwrap();
        let err = AuthenticatedClient::new(client, "not-a-key").unwrap_err();
        assert!(matches!(err, SdkError::Signing(_)));
    }

    #[test]
    fn test_clones_share_nonces() {
        let client = HyperliquidClient::builder().build().unwrap();
        let auth = client.authenticate(KEY).unwrap();
        let other = auth.clone();
        let a = auth.nonces.next();
        let b = other.nonces.next();
        assert!(b > a);
    }

    #[test]
    fn test_sign_skips_vault_for_user_signed_actions() {
        use crate::action::{Action, CancelAction, UsdSendAction};

        let auth = HyperliquidClient::builder()
            .build()
            .unwrap()
            .authenticate(KEY)
            .unwrap()
            .with_vault(Address::repeat_byte(0x22));
        let exchange = auth.exchange();

        let cancel = exchange
            .sign(Action::Cancel(CancelAction { cancels: vec![] }), 1)
            .unwrap();
        assert!(cancel.vault_address.is_some());

        let send = exchange
            .sign(
                Action::UsdSend(UsdSendAction {
                    signature_chain_id: String::new(),
                    hyperliquid_chain: String::new(),
                    destination: "0x0000000000000000000000000000000000000001".into(),
                    amount: "1".into(),
                    time: 1,
                }),
                1,
            )
            .unwrap();
        assert!(send.vault_address.is_none());
        assert_eq!(send.action["hyperliquidChain"], "Mainnet");
    }
}
