//! WebSocket layer — messages, connection state, events, configuration.
//!
//! - [`native::TransportClient`] owns the socket: heartbeat, reconnect with
//!   exponential backoff, subscription tracking.
//! - [`router::SubscriptionRouter`] sits on top: dispatches channel frames to
//!   handlers and correlates `post` requests with their replies.
//!
//! Both require the `ws-native` feature. This module defines the shared
//! message/event/config types.

pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

#[cfg(feature = "ws-native")]
pub mod router;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

pub use subscriptions::Subscription;

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum MessageOut {
    Subscribe { subscription: Subscription },
    Unsubscribe { subscription: Subscription },
    Post { id: u64, request: PostRequest },
    Ping,
}

/// What a `post` request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// An `/info` request body.
    Info,
    /// A signed `/exchange` envelope.
    Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRequest {
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub payload: Value,
}

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle of the transport.
///
/// ```text
/// Disconnected ─connect─▶ Connecting ─open─▶ Connected
///                              ▲                 │ drop
///                              └─timer── Reconnecting ◀┘
/// ```
///
/// `GiveUp` returns to `Disconnected`; `Close` reaches the terminal `Closed`
/// from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

/// Inputs to [`ConnectionState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connect,
    Opened,
    /// Connect attempt failed or an open socket dropped; a retry follows.
    Dropped,
    /// Backoff elapsed.
    RetryTimer,
    /// Reconnect disabled or attempts exhausted.
    GiveUp,
    Close,
}

impl ConnectionState {
    /// Next state, or `None` if `transition` is not valid from `self`.
    pub fn transition(self, transition: Transition) -> Option<ConnectionState> {
        use ConnectionState::*;
        match (self, transition) {
            (Closed, _) => None,
            (_, Transition::Close) => Some(Closed),
            (Disconnected, Transition::Connect) => Some(Connecting),
            (Connecting, Transition::Opened) => Some(Connected),
            (Connecting | Connected, Transition::Dropped) => Some(Reconnecting),
            (Reconnecting, Transition::RetryTimer) => Some(Connecting),
            (Connecting | Connected | Reconnecting, Transition::GiveUp) => Some(Disconnected),
            _ => None,
        }
    }
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// Events emitted by the transport, in order.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// A parsed inbound frame.
    Message(Value),
    Connected,
    /// The socket closed or errored.
    Disconnected { code: Option<u16>, reason: String },
    /// Reconnect attempt `attempt` will start after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Terminal: attempts exhausted, no further retries.
    ReconnectFailed { attempts: u32 },
    /// A connect attempt or protocol error.
    Error(String),
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Reconnect backoff: `delay_i = min(initial_delay * 2^(i-1), max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Configuration for the WS transport.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Reconnect after an unexpected drop.
    pub reconnect: bool,
    pub backoff: ReconnectConfig,
    pub ping_interval: Duration,
    pub connect_timeout: Duration,
    pub event_channel_capacity: usize,
    pub command_channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::MAINNET_WS_URL.to_string(),
            reconnect: true,
            backoff: ReconnectConfig::default(),
            ping_interval: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(30),
            event_channel_capacity: 1024,
            command_channel_capacity: 64,
        }
    }
}

impl WsConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_out_wire_format() {
        let sub = MessageOut::Subscribe {
            subscription: Subscription::Trades { coin: "BTC".into() },
        };
        assert_eq!(
            serde_json::to_value(&sub).unwrap(),
            json!({"method": "subscribe", "subscription": {"type": "trades", "coin": "BTC"}})
        );
        assert_eq!(
            serde_json::to_value(MessageOut::Ping).unwrap(),
            json!({"method": "ping"})
        );
        let post = MessageOut::Post {
            id: 7,
            request: PostRequest {
                kind: PostKind::Info,
                payload: json!({"type": "allMids"}),
            },
        };
        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            json!({"method": "post", "id": 7, "request": {"type": "info", "payload": {"type": "allMids"}}})
        );
    }

    #[test]
    fn test_backoff_schedule() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            max_attempts: 6,
        };
        let delays: Vec<u128> = (1..=6)
            .map(|i| config.delay_for_attempt(i).as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn test_backoff_never_overflows() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(200), config.max_delay);
        assert_eq!(config.delay_for_attempt(0), config.initial_delay);
    }

    #[test]
    fn test_state_transitions() {
        use ConnectionState::*;
        assert_eq!(Disconnected.transition(Transition::Connect), Some(Connecting));
        assert_eq!(Connecting.transition(Transition::Opened), Some(Connected));
        assert_eq!(Connected.transition(Transition::Dropped), Some(Reconnecting));
        assert_eq!(Reconnecting.transition(Transition::RetryTimer), Some(Connecting));
        assert_eq!(Reconnecting.transition(Transition::GiveUp), Some(Disconnected));
        assert_eq!(Connected.transition(Transition::Close), Some(Closed));
        assert_eq!(Disconnected.transition(Transition::Close), Some(Closed));
    }

    #[test]
    fn test_closed_is_terminal() {
        use ConnectionState::*;
        for t in [
            Transition::Connect,
            Transition::Opened,
            Transition::Dropped,
            Transition::RetryTimer,
            Transition::GiveUp,
            Transition::Close,
        ] {
            assert_eq!(Closed.transition(t), None);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        use ConnectionState::*;
        assert_eq!(Connected.transition(Transition::Connect), None);
        assert_eq!(Disconnected.transition(Transition::Opened), None);
        assert_eq!(Connecting.transition(Transition::RetryTimer), None);
    }
}
