//! Network constants for the Hyperliquid venue.

/// Mainnet REST API base URL.
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";

/// Testnet REST API base URL.
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

/// Mainnet WebSocket URL.
pub const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

/// Testnet WebSocket URL.
pub const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";

/// Which venue deployment requests are signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        }
    }

    pub fn ws_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_WS_URL,
            Network::Testnet => TESTNET_WS_URL,
        }
    }

    /// Phantom-agent `source` for L1 action signing.
    pub fn agent_source(&self) -> &'static str {
        match self {
            Network::Mainnet => "a",
            Network::Testnet => "b",
        }
    }

    /// Value injected as `hyperliquidChain` into user-signed actions.
    pub fn hyperliquid_chain(&self) -> &'static str {
        match self {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
        }
    }

    /// Value injected as `signatureChainId` into user-signed actions.
    pub fn signature_chain_id(&self) -> &'static str {
        match self {
            Network::Mainnet => "0xa4b1",
            Network::Testnet => "0x66eee",
        }
    }

    /// EIP-712 `chainId` of the user-signed action domain.
    pub fn user_signing_chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 42_161,
            Network::Testnet => 421_614,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hyperliquid_chain())
    }
}
