//! Native WebSocket transport — `tokio-tungstenite`.
//!
//! - Background tokio task owns the socket
//! - Application-level `{"method":"ping"}` heartbeat
//! - Exponential backoff reconnection, bounded by `max_attempts`
//! - Subscription tracking + auto-resubscribe on reconnect
//! - Ordered event delivery through a bounded channel (backpressure)
//!
//! Nothing is queued while disconnected: `send` fails unless the state is
//! `Connected`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{ConnectionState, MessageOut, Subscription, Transition, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Close,
}

enum SessionEnd {
    /// `close()` was called or the client was dropped.
    Closed,
    Dropped(String),
}

// ─── State shared between handle and task ────────────────────────────────────

struct Shared {
    state: watch::Sender<ConnectionState>,
    last_error: ArcSwapOption<String>,
    attempts: AtomicU32,
    /// Subscriptions to replay on the next connection. Outlives the task,
    /// so `connect()` after a give-up resubscribes too.
    subscriptions: ArcSwap<Vec<Subscription>>,
}

impl Shared {
    fn apply(&self, transition: Transition) {
        self.state.send_if_modified(|state| match state.transition(transition) {
            Some(next) => {
                let changed = *state != next;
                *state = next;
                changed
            }
            None => {
                tracing::debug!("Ignoring {:?} in state {:?}", transition, state);
                false
            }
        });
    }

    fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    event_tx: mpsc::Sender<WsEvent>,
    shared: Arc<Shared>,
    subscriptions: Vec<Subscription>,
    attempts: u32,
}

impl TaskState {
    /// Lifecycle events share the ordered, bounded channel with frames and
    /// wait for room like them.
    async fn emit(&self, event: WsEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }

    fn track(&mut self, msg: &MessageOut) {
        if track_subscription(&mut self.subscriptions, msg) {
            self.shared
                .subscriptions
                .store(Arc::new(self.subscriptions.clone()));
        }
    }
}

// ─── Public TransportClient ──────────────────────────────────────────────────

/// Persistent WebSocket connection with heartbeat and reconnect.
///
/// The command and event channels live as long as the client, so the event
/// receiver taken once keeps working across reconnects and repeated
/// `connect()` calls.
pub struct TransportClient {
    config: WsConfig,
    cmd_tx: mpsc::Sender<Command>,
    cmd_rx: Arc<Mutex<mpsc::Receiver<Command>>>,
    event_tx: mpsc::Sender<WsEvent>,
    event_rx: Option<mpsc::Receiver<WsEvent>>,
    shared: Arc<Shared>,
    task_handle: Option<JoinHandle<()>>,
}

impl TransportClient {
    /// Create a new transport. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            cmd_tx,
            cmd_rx: Arc::new(Mutex::new(cmd_rx)),
            event_tx,
            event_rx: Some(event_rx),
            shared: Arc::new(Shared {
                state,
                last_error: ArcSwapOption::empty(),
                attempts: AtomicU32::new(0),
                subscriptions: ArcSwap::from_pointee(Vec::new()),
            }),
            task_handle: None,
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Open the connection and wait until it is `Connected`.
    ///
    /// Subscriptions tracked before a give-up are replayed on the new
    /// connection.
    ///
    /// Fails with `ConnectionFailed` once reconnect attempts are exhausted
    /// (or on the first failure when reconnect is disabled), and with
    /// `Closed` after [`close`](Self::close).
    pub async fn connect(&mut self) -> Result<(), WsError> {
        match self.shared.current() {
            ConnectionState::Closed => return Err(WsError::Closed),
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Disconnected => self.spawn_task(),
            ConnectionState::Connecting | ConnectionState::Reconnecting => {}
        }

        let mut state_rx = self.shared.state.subscribe();
        loop {
            let state = *state_rx.borrow_and_update();
            match state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Closed => return Err(WsError::Closed),
                ConnectionState::Disconnected => {
                    return Err(WsError::ConnectionFailed {
                        attempts: self.shared.attempts.load(Ordering::SeqCst),
                        reason: self
                            .shared
                            .last_error
                            .load_full()
                            .map(|e| e.as_ref().clone())
                            .unwrap_or_else(|| "connection lost".to_string()),
                    });
                }
                ConnectionState::Connecting | ConnectionState::Reconnecting => {}
            }
            state_rx.changed().await.map_err(|_| WsError::Closed)?;
        }
    }

    fn spawn_task(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            // Previous task already gave up; it only needs to release the
            // command receiver.
            handle.abort();
        }
        self.shared.attempts.store(0, Ordering::SeqCst);
        self.shared.last_error.store(None);
        self.shared.apply(Transition::Connect);

        let task = TaskState {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            shared: Arc::clone(&self.shared),
            subscriptions: self.shared.subscriptions.load().as_ref().clone(),
            attempts: 0,
        };
        let cmd_rx = Arc::clone(&self.cmd_rx);
        self.task_handle = Some(tokio::spawn(async move {
            let cmd_rx = cmd_rx.lock_owned().await;
            run_task(task, cmd_rx).await;
        }));
    }

    /// Close the connection for good. The state becomes `Closed` and later
    /// `connect()` calls fail.
    pub async fn close(&mut self) {
        if let Some(mut handle) = self.task_handle.take() {
            let cmd_tx = &self.cmd_tx;
            let stop = async {
                if !handle.is_finished() {
                    let _ = cmd_tx.send(Command::Close).await;
                }
                let _ = (&mut handle).await;
            };
            if tokio::time::timeout(Duration::from_secs(5), stop).await.is_err() {
                tracing::warn!("WebSocket task did not stop in time");
                handle.abort();
            }
        }
        self.shared.apply(Transition::Close);
    }

    /// Queue a message for the socket.
    ///
    /// Fails immediately with `NotConnected` unless the state is `Connected`.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match self.shared.current() {
            ConnectionState::Connected => {}
            ConnectionState::Closed => return Err(WsError::Closed),
            _ => return Err(WsError::NotConnected),
        }
        self.cmd_tx.try_send(Command::Send(msg)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                WsError::SendFailed("Command channel full".into())
            }
            mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
        })
    }

    pub fn subscribe(&self, subscription: Subscription) -> Result<(), WsError> {
        self.send(MessageOut::Subscribe { subscription })
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> Result<(), WsError> {
        self.send(MessageOut::Unsubscribe { subscription })
    }

    /// Take the ordered event stream. Returns `None` after the first call.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<WsEvent>> {
        self.event_rx.take()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.current()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }
}

impl Drop for TransportClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut task: TaskState, mut cmd_rx: OwnedMutexGuard<mpsc::Receiver<Command>>) {
    // Commands queued before this session are stale.
    while cmd_rx.try_recv().is_ok() {}

    loop {
        // ── 1. Attempt connection (state: Connecting) ───────────────────
        let reason = match attempt_connect(&task.config).await {
            Ok((mut sink, stream)) => {
                // ── 2. Connected ─────────────────────────────────────────
                task.attempts = 0;
                task.shared.attempts.store(0, Ordering::SeqCst);
                task.shared.apply(Transition::Opened);
                tracing::info!("WebSocket connected to {}", task.config.url);
                task.emit(WsEvent::Connected).await;

                resubscribe_all(&mut sink, &task.subscriptions).await;

                // ── 3. Inner select! loop ────────────────────────────────
                match run_connected(&mut task, &mut cmd_rx, sink, stream).await {
                    SessionEnd::Closed => {
                        task.shared.apply(Transition::Close);
                        return;
                    }
                    SessionEnd::Dropped(reason) => reason,
                }
            }
            Err(e) => {
                tracing::warn!("WebSocket connection failed: {}", e);
                task.emit(WsEvent::Error(format!("Connection failed: {}", e)))
                    .await;
                e
            }
        };
        task.shared.last_error.store(Some(Arc::new(reason)));

        // ── 4. Reconnect decision ────────────────────────────────────────
        if !task.config.reconnect {
            task.shared.apply(Transition::GiveUp);
            return;
        }
        if task.attempts >= task.config.backoff.max_attempts {
            tracing::error!(
                "WebSocket reconnect failed after {} attempt(s)",
                task.attempts
            );
            task.shared.apply(Transition::GiveUp);
            task.emit(WsEvent::ReconnectFailed {
                attempts: task.attempts,
            })
            .await;
            return;
        }

        task.shared.apply(Transition::Dropped);
        task.attempts += 1;
        task.shared.attempts.store(task.attempts, Ordering::SeqCst);
        let delay = task.config.backoff.delay_for_attempt(task.attempts);
        tracing::info!(
            "Reconnect attempt {}/{} in {}ms",
            task.attempts,
            task.config.backoff.max_attempts,
            delay.as_millis()
        );
        task.emit(WsEvent::Reconnecting {
            attempt: task.attempts,
            delay,
        })
        .await;

        if let SessionEnd::Closed = backoff_wait(&mut task, &mut cmd_rx, delay).await {
            task.shared.apply(Transition::Close);
            return;
        }
        task.shared.apply(Transition::RetryTimer);
    }
}

/// The inner connected loop. Runs until the connection breaks.
async fn run_connected(
    task: &mut TaskState,
    cmd_rx: &mut mpsc::Receiver<Command>,
    mut sink: WsSink,
    mut stream: SplitStream<WsStream>,
) -> SessionEnd {
    let ping_every = task.config.ping_interval;
    let mut ping_interval =
        tokio::time::interval_at(tokio::time::Instant::now() + ping_every, ping_every);

    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        match serde_json::from_str::<Value>(text_str) {
                            Ok(value) => {
                                if task.event_tx.send(WsEvent::Message(value)).await.is_err() {
                                    tracing::trace!("Event receiver dropped");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(
                                    "WS parse error: {} — raw: {}",
                                    e,
                                    text_str
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        tracing::info!("WebSocket closed by server: {} {}", code, reason);
                        task.emit(WsEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        })
                        .await;
                        return SessionEnd::Dropped(reason);
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::warn!("WebSocket error: {}", reason);
                        task.emit(WsEvent::Disconnected {
                            code: None,
                            reason: reason.clone(),
                        })
                        .await;
                        return SessionEnd::Dropped(reason);
                    }
                    None => {
                        task.emit(WsEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        })
                        .await;
                        return SessionEnd::Dropped("Stream ended".into());
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        task.track(&msg_out);
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("Send failed: {}", e);
                        }
                    }
                    Some(Command::Close) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client close".into(),
                        }))).await;
                        task.emit(WsEvent::Disconnected {
                            code: Some(1000),
                            reason: "Client close".into(),
                        })
                        .await;
                        return SessionEnd::Closed;
                    }
                }
            }

            // ── c) Heartbeat ─────────────────────────────────────────────
            _ = ping_interval.tick() => {
                if let Err(e) = send_msg(&mut sink, &MessageOut::Ping).await {
                    tracing::warn!("Failed to send ping: {}", e);
                }
            }
        }
    }
}

/// Sleep out the backoff delay while still honouring `close()`.
async fn backoff_wait(
    task: &mut TaskState,
    cmd_rx: &mut mpsc::Receiver<Command>,
    delay: Duration,
) -> SessionEnd {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return SessionEnd::Dropped(String::new()),
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(msg)) => {
                    task.track(&msg);
                    tracing::warn!("Dropping message sent while reconnecting");
                }
                Some(Command::Close) | None => return SessionEnd::Closed,
            },
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(config: &WsConfig) -> Result<(WsSink, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(config.connect_timeout, connect_async(&config.url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

async fn send_msg(sink: &mut WsSink, msg: &MessageOut) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Subscription tracking ──────────────────────────────────────────────────

/// Returns whether the tracked set changed.
fn track_subscription(subs: &mut Vec<Subscription>, msg: &MessageOut) -> bool {
    match msg {
        MessageOut::Subscribe { subscription } => {
            if subs.contains(subscription) {
                return false;
            }
            tracing::debug!("Tracking subscription: {:?}", subscription);
            subs.push(subscription.clone());
            true
        }
        MessageOut::Unsubscribe { subscription } => {
            let before = subs.len();
            subs.retain(|s| s != subscription);
            let removed = subs.len() < before;
            if removed {
                tracing::debug!("Stopped tracking subscription: {:?}", subscription);
            }
            removed
        }
        MessageOut::Post { .. } | MessageOut::Ping => false,
    }
}

async fn resubscribe_all(sink: &mut WsSink, subs: &[Subscription]) {
    if subs.is_empty() {
        return;
    }
    tracing::info!("Resubscribing to {} tracked subscription(s)", subs.len());
    for sub in subs {
        let msg = MessageOut::Subscribe {
            subscription: sub.clone(),
        };
        if let Err(e) = send_msg(sink, &msg).await {
            tracing::warn!("Failed to resubscribe: {}", e);
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn trades(coin: &str) -> MessageOut {
        MessageOut::Subscribe {
            subscription: Subscription::Trades { coin: coin.into() },
        }
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = TransportClient::new(WsConfig::default());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_when_not_connected() {
        let client = TransportClient::new(WsConfig::default());
        let result = client.send(MessageOut::Ping);
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_event_receiver_taken_once() {
        let mut client = TransportClient::new(WsConfig::default());
        assert!(client.take_event_receiver().is_some());
        assert!(client.take_event_receiver().is_none());
    }

    #[test]
    fn test_track_subscription_add_and_dedup() {
        let mut subs = Vec::new();
        assert!(track_subscription(&mut subs, &trades("BTC")));
        assert!(!track_subscription(&mut subs, &trades("BTC")));
        assert!(track_subscription(&mut subs, &trades("ETH")));
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_track_subscription_remove() {
        let mut subs = Vec::new();
        track_subscription(&mut subs, &trades("BTC"));
        track_subscription(
            &mut subs,
            &MessageOut::Unsubscribe {
                subscription: Subscription::Trades { coin: "BTC".into() },
            },
        );
        assert!(subs.is_empty());
    }

    #[test]
    fn test_track_subscription_ignores_ping_and_post() {
        let mut subs = Vec::new();
        assert!(!track_subscription(&mut subs, &MessageOut::Ping));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_extract_close() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        assert_eq!(extract_close(Some(&frame)), (1000, "goodbye".to_string()));
        assert_eq!(extract_close(None), (1006, "No close frame".to_string()));
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let mut client = TransportClient::new(WsConfig::default());
        client.close().await;
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(matches!(client.connect().await, Err(WsError::Closed)));
        assert!(matches!(client.send(MessageOut::Ping), Err(WsError::Closed)));
    }

    #[tokio::test]
    async fn test_connect_without_reconnect_fails_fast() {
        // Nothing listens on port 1.
        let mut client = TransportClient::new(WsConfig {
            url: "ws://127.0.0.1:1".into(),
            reconnect: false,
            connect_timeout: Duration::from_secs(2),
            ..WsConfig::default()
        });
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, WsError::ConnectionFailed { attempts: 0, .. }));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnect_failed_survives_full_event_channel() {
        let mut client = TransportClient::new(WsConfig {
            url: "ws://127.0.0.1:1".into(),
            connect_timeout: Duration::from_secs(2),
            event_channel_capacity: 1,
            backoff: crate::ws::ReconnectConfig {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(10),
                max_attempts: 2,
            },
            ..WsConfig::default()
        });
        let mut events = client.take_event_receiver().unwrap();

        // A slow consumer keeps the single-slot channel full most of the time.
        let drain = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(event) = events.recv().await {
                tokio::time::sleep(Duration::from_millis(25)).await;
                let done = matches!(event, WsEvent::ReconnectFailed { .. });
                seen.push(event);
                if done {
                    break;
                }
            }
            seen
        });

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, WsError::ConnectionFailed { attempts: 2, .. }));

        let seen = tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .unwrap()
            .unwrap();
        let reconnecting = seen
            .iter()
            .filter(|e| matches!(e, WsEvent::Reconnecting { .. }))
            .count();
        assert_eq!(reconnecting, 2);
        assert!(matches!(
            seen.last(),
            Some(WsEvent::ReconnectFailed { attempts: 2 })
        ));
    }

    #[test]
    fn test_tracked_subscriptions_outlive_task() {
        let client = TransportClient::new(WsConfig::default());
        let (event_tx, _event_rx) = mpsc::channel(1);
        let mut task = TaskState {
            config: WsConfig::default(),
            event_tx,
            shared: Arc::clone(&client.shared),
            subscriptions: Vec::new(),
            attempts: 0,
        };
        task.track(&trades("BTC"));
        task.track(&trades("ETH"));
        task.track(&MessageOut::Unsubscribe {
            subscription: Subscription::Trades { coin: "BTC".into() },
        });
        drop(task);

        let carried = client.shared.subscriptions.load();
        assert_eq!(
            carried.as_slice(),
            &[Subscription::Trades { coin: "ETH".into() }]
        );
    }
}
