//! Subscription router — frame dispatch and request/response correlation.
//!
//! The router owns a [`TransportClient`] and one dispatch task per client
//! that drains the transport's event channel in order. Channel frames go to
//! every handler whose channel and discriminators match; `post` replies
//! settle the pending request with the same id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::error::{SdkError, WsError};
use crate::signing::NonceGenerator;
use crate::ws::native::TransportClient;
use crate::ws::{ConnectionState, MessageOut, PostKind, PostRequest, Subscription, WsConfig, WsEvent};

/// Frame callback. Receives the whole `{channel, data}` frame.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Returned by [`SubscriptionRouter::on`]; pass to [`SubscriptionRouter::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type PendingMap = DashMap<u64, oneshot::Sender<Result<Value, SdkError>>>;

struct Registration {
    channel: String,
    discriminators: Vec<(String, String)>,
    callback: Handler,
}

struct RouterInner {
    handlers: DashMap<u64, Registration>,
    next_handler_id: AtomicU64,
    pending: PendingMap,
    ids: NonceGenerator,
    lifecycle: broadcast::Sender<WsEvent>,
}

/// Frame field names that differ from the subscription field they carry.
fn frame_key(channel: &str, key: &str) -> &'static str {
    match (channel, key) {
        ("candle", "coin") => "s",
        ("candle", "interval") => "i",
        _ => "",
    }
}

impl RouterInner {
    fn dispatch(&self, frame: &Value) {
        let Some(channel) = frame.get("channel").and_then(Value::as_str) else {
            tracing::debug!("Ignoring frame without channel: {}", frame);
            return;
        };

        if channel == "post" {
            self.settle(frame);
            return;
        }

        let mut matched: Vec<(u64, Handler)> = self
            .handlers
            .iter()
            .filter(|entry| {
                let reg = entry.value();
                reg.channel == channel
                    && reg
                        .discriminators
                        .iter()
                        .all(|(key, expected)| matches_field(frame, channel, key, expected))
            })
            .map(|entry| (*entry.key(), Arc::clone(&entry.value().callback)))
            .collect();
        matched.sort_by_key(|(id, _)| *id);

        for (_, callback) in matched {
            callback(frame);
        }
    }

    fn settle(&self, frame: &Value) {
        let data = frame.get("data").unwrap_or(&Value::Null);
        let id = data
            .get("id")
            .or_else(|| frame.get("id"))
            .and_then(Value::as_u64);
        let Some(id) = id else {
            tracing::warn!("Post reply without id: {}", frame);
            return;
        };
        let Some((_, tx)) = self.pending.remove(&id) else {
            tracing::debug!(id, "Post reply for unknown or settled request");
            return;
        };

        let response = data.get("response").cloned().unwrap_or(Value::Null);
        let result = if response.get("type").and_then(Value::as_str) == Some("error") {
            let message = match response.get("payload") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "unknown error".to_string(),
            };
            Err(WsError::PostRejected { id, message }.into())
        } else {
            Ok(response)
        };
        let _ = tx.send(result);
    }
}

/// Whether `frame.data` (or its first element, for array payloads) holds
/// `expected` under `key`. `user` compares case-insensitively.
fn matches_field(frame: &Value, channel: &str, key: &str, expected: &str) -> bool {
    let data = match frame.get("data") {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    let Some(object) = data else {
        return false;
    };
    let value = object
        .get(key)
        .or_else(|| object.get(frame_key(channel, key)))
        .and_then(Value::as_str);
    match value {
        Some(actual) if key == "user" => actual.eq_ignore_ascii_case(expected),
        Some(actual) => actual == expected,
        None => false,
    }
}

/// Removes a pending entry when the awaiting future finishes or is dropped.
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

// ─── Public SubscriptionRouter ───────────────────────────────────────────────

/// Routes inbound frames to handlers and correlates `post` requests.
pub struct SubscriptionRouter {
    transport: TransportClient,
    inner: Arc<RouterInner>,
    dispatch_task: Option<JoinHandle<()>>,
}

impl SubscriptionRouter {
    pub fn new(config: WsConfig) -> Self {
        Self::with_transport(TransportClient::new(config))
    }

    pub fn with_transport(transport: TransportClient) -> Self {
        let (lifecycle, _) = broadcast::channel(64);
        Self {
            transport,
            inner: Arc::new(RouterInner {
                handlers: DashMap::new(),
                next_handler_id: AtomicU64::new(1),
                pending: DashMap::new(),
                ids: NonceGenerator::new(),
                lifecycle,
            }),
            dispatch_task: None,
        }
    }

    /// Connect the transport and start dispatching.
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.dispatch_task.is_none() {
            if let Some(mut events) = self.transport.take_event_receiver() {
                let inner = Arc::clone(&self.inner);
                self.dispatch_task = Some(tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        match event {
                            WsEvent::Message(frame) => inner.dispatch(&frame),
                            other => {
                                let _ = inner.lifecycle.send(other);
                            }
                        }
                    }
                }));
            }
        }
        self.transport.connect().await
    }

    /// Close the transport for good and stop dispatching.
    pub async fn close(&mut self) {
        self.transport.close().await;
        if let Some(handle) = self.dispatch_task.take() {
            handle.abort();
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// Lifecycle events (everything except frames).
    pub fn lifecycle_events(&self) -> broadcast::Receiver<WsEvent> {
        self.inner.lifecycle.subscribe()
    }

    // ── Handlers ─────────────────────────────────────────────────────────

    /// Register `callback` for frames on `channel` whose data carries every
    /// `(field, value)` pair in `discriminators`.
    pub fn on<F>(&self, channel: &str, discriminators: &[(&str, &str)], callback: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.insert(
            id,
            Registration {
                channel: channel.to_string(),
                discriminators: discriminators
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                callback: Arc::new(callback),
            },
        );
        HandlerId(id)
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn off(&self, id: HandlerId) -> bool {
        self.inner.handlers.remove(&id.0).is_some()
    }

    // ── Subscriptions ────────────────────────────────────────────────────

    pub fn subscribe(&self, subscription: Subscription) -> Result<(), WsError> {
        tracing::debug!("Subscribing to {:?}", subscription);
        self.transport.subscribe(subscription)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> Result<(), WsError> {
        tracing::debug!("Unsubscribing from {:?}", subscription);
        self.transport.unsubscribe(subscription)
    }

    /// Register a handler scoped to `subscription` and subscribe.
    pub fn subscribe_with<F>(&self, subscription: Subscription, callback: F) -> Result<HandlerId, WsError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let discriminators = subscription.frame_discriminators();
        let pairs: Vec<(&str, &str)> = discriminators
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        let id = self.on(subscription.channel(), &pairs, callback);
        if let Err(e) = self.subscribe(subscription) {
            self.off(id);
            return Err(e);
        }
        Ok(id)
    }

    // ── Requests ─────────────────────────────────────────────────────────

    /// Send a request over the socket and wait for its reply.
    ///
    /// The pending entry is removed exactly once: by the reply, by the
    /// timeout, or when this future is dropped. Requests in flight during a
    /// disconnect are left to time out.
    pub async fn post_request(
        &self,
        kind: PostKind,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, SdkError> {
        let id = self.inner.ids.next();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.inner.pending,
            id,
        };

        tracing::debug!(id, ?kind, "Posting request");
        self.transport.send(MessageOut::Post {
            id,
            request: PostRequest { kind, payload },
        })?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(WsError::Closed.into()),
            Err(_) => {
                tracing::warn!(id, "Post request timed out");
                Err(SdkError::Timeout {
                    id,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Requests awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Registered handlers per channel.
    pub fn handler_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for entry in self.inner.handlers.iter() {
            *counts.entry(entry.value().channel.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl Drop for SubscriptionRouter {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatch_task.take() {
            handle.abort();
        }
    }
}
