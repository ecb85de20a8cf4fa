//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    /// Precision-losing numeric conversion, unknown asset, malformed field
    /// list, or a rate-limiter weight above bucket capacity.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    /// A WebSocket request exceeded its deadline.
    #[error("Request {id} timed out after {timeout_ms}ms")]
    Timeout { id: u64, timeout_ms: u64 },

    /// Symbol metadata could not be loaded, or refresh halted after
    /// too many consecutive failures.
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("MessagePack encoding error: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
}

impl SdkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Whether this is the venue rejecting a request (non-2xx, or a
    /// `{"status":"err"}` body).
    pub fn is_api_error(&self) -> bool {
        matches!(self, SdkError::Http(HttpError::Api { .. }))
    }
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    /// No HTTP response was received (DNS, connect, TLS, body read).
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with an error.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    /// `close()` was called; the client will not reconnect.
    #[error("Connection closed by client")]
    Closed,

    /// Reconnect attempts exhausted.
    #[error("Connection failed after {attempts} attempt(s): {reason}")]
    ConnectionFailed { attempts: u32, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The venue answered a `post` request with an error payload.
    #[error("Post request {id} rejected: {message}")]
    PostRejected { id: u64, message: String },

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}
