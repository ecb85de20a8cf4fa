//! # Hyperliquid client core
//!
//! Action hashing and signing, nonce and rate-limit management, a symbol
//! registry, and a reconnecting WebSocket transport with a subscription
//! router for the Hyperliquid venue.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Actions, MessagePack action hashing, EIP-712 signing, nonces,
//!    rate limiting, symbol registry (always available)
//! 2. **HTTP API** — `HttpTransport` for `/info` and `/exchange`
//! 3. **WebSocket** — `TransportClient` (`tokio-tungstenite`) and
//!    `SubscriptionRouter`
//! 4. **High-Level Client** — `HyperliquidClient` / `AuthenticatedClient` with
//!    nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hyperliquid_core::prelude::*;
//!
//! let client = HyperliquidClient::builder()
//!     .network(Network::Testnet)
//!     .build()?;
//! client.initialize().await?;
//!
//! let book = client.info().l2_book("BTC-PERP").await?;
//!
//! let trader = client.authenticate(&private_key)?;
//! let order = OrderRequest::limit("BTC-PERP", true, price, size);
//! trader.exchange().place_order(order).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared helpers: hashing, addresses, decimal strings, client order ids.
pub mod shared;

/// Venue actions and their canonical hashing.
pub mod action;

/// EIP-712 signing (L1 phantom agent and user-signed schemes) and nonces.
pub mod signing;

/// Token-bucket rate limiter for REST weight.
pub mod rate_limit;

/// Symbol ↔ asset index registry.
pub mod symbols;

/// Domain modules (vertical slices): types, wire types, sub-clients.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL and chain constants.
pub mod network;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP transport with rate-limit gating.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 3: WebSocket ───────────────────────────────────────────────────────

/// WebSocket transport and subscription router.
pub mod ws;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `HyperliquidClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared
    pub use crate::shared::{Cloid, MarketClass};

    // Actions
    pub use crate::action::{
        Action, ActionCodec, Grouping, OrderTypeWire, SigningScheme, Tif, Tpsl, WireOrder,
    };

    // Signing
    pub use crate::signing::{ExchangeSigner, NonceGenerator, Signature, SignedEnvelope};

    // Rate limiting + symbols
    pub use crate::rate_limit::{RateLimitConfig, RateLimiter, Throttle};
    pub use crate::symbols::{
        AssetEntry, Direction, MetaSource, RegistryConfig, RegistryHealth, SymbolRegistry,
    };

    // Domain types
    pub use crate::domain::exchange::{OrderKind, OrderRequest};
    pub use crate::domain::info::{L2Book, Level};

    // Errors
    pub use crate::error::{HttpError, SdkError, WsError};

    // Network
    pub use crate::network::Network;

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AuthenticatedClient, ExchangeClient, HyperliquidClient, HyperliquidClientBuilder,
        InfoClient,
    };
    #[cfg(feature = "http")]
    pub use crate::http::HttpTransport;

    // WebSocket types
    pub use crate::ws::{
        ConnectionState, MessageOut, PostKind, ReconnectConfig, Subscription, WsConfig, WsEvent,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::TransportClient;
    #[cfg(feature = "ws-native")]
    pub use crate::ws::router::{HandlerId, SubscriptionRouter};
}
