use super::{
    ClientState, ConnectionManager, ConnectionState, FeedClientBuilder, FeedClientOptions,
    Subscription,
};
use crate::messaging::{MessageRouter, ObserverRegistry};
use crate::types::{DEFAULT_SUBSCRIPTION_BUFFER, QueueUpdate, RealtimeError, Result};
use crate::websocket::{FrameStream, Transport, TransportFactory};
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;

/// Reconnecting subscription to the hospital queue channel.
///
/// `RealtimeFeedClient` owns one logical connection to the queue feed, reopens it
/// with exponential backoff when it drops, and fans every decoded payload out to
/// the registered observers. Observers never manage the connection: the first
/// [`subscribe`](Self::subscribe) opens it and removing the last observer closes it.
///
/// The client is cheap to clone; clones share the same connection and observers.
///
/// # Example
///
/// ```no_run
/// use queue_realtime_rs::{FeedClientOptions, RealtimeFeedClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeFeedClient::new("wss://hospital.example/ws", FeedClientOptions::default())?;
///
/// let subscription = client.subscribe(|payload| {
///     println!("queue changed: {}", payload);
/// });
///
/// // Later, when the view goes away
/// subscription.unsubscribe();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeFeedClient {
    pub(crate) endpoint: Option<String>,
    pub(crate) options: FeedClientOptions,
    pub(crate) factory: Arc<dyn TransportFactory>,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Registered observers, in delivery order
    pub(crate) observers: Arc<ObserverRegistry>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl RealtimeFeedClient {
    /// Creates a client for `<base>/queue`.
    ///
    /// An empty `base` yields a disabled client; see [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] or [`RealtimeError::Configuration`] if a
    /// non-empty base is not a valid `ws://` or `wss://` URL.
    pub fn new(base: impl Into<String>, options: FeedClientOptions) -> Result<Self> {
        FeedClientBuilder::new(base).map(|builder| builder.options(options).build())
    }

    /// Creates a client whose base address comes from `QUEUE_WS_URL`
    pub fn from_env(options: FeedClientOptions) -> Result<Self> {
        FeedClientBuilder::from_env().map(|builder| builder.options(options).build())
    }

    /// Resolved channel endpoint, `None` when the feed is disabled
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn options(&self) -> &FeedClientOptions {
        &self.options
    }

    /// Opens the channel and waits until it is ready.
    ///
    /// Resolves immediately if the transport is already open. Otherwise starts a
    /// connection sequence, or joins the one in flight, and settles once: `Ok` on
    /// the first successful open, or an error when the sequence ends for good.
    /// Failed attempts in between are retried with exponential backoff and are
    /// not reported individually.
    ///
    /// Calling `connect()` re-enables automatic reconnection after a
    /// [`disconnect`](Self::disconnect).
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::Configuration`] if no endpoint is configured. No network
    ///   action is taken and nothing is retried.
    /// - [`RealtimeError::ConnectionExhausted`] if every retry failed.
    /// - [`RealtimeError::Disconnected`] if the sequence was cancelled by
    ///   `disconnect()` or by the last observer leaving.
    pub async fn connect(&self) -> Result<()> {
        let Some(url) = self.endpoint.clone() else {
            tracing::warn!("Queue feed is disabled, no endpoint configured");
            return Err(RealtimeError::Configuration(
                "no channel endpoint configured".to_string(),
            ));
        };

        let waiter = {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = false;

            if self.connection.is_connected() {
                return Ok(());
            }

            let (tx, rx) = oneshot::channel();
            state.pending_connects.push(tx);
            if !state.sequence_active {
                self.spawn_sequence(&mut state, url, None);
            }
            rx
        };

        waiter.await.unwrap_or(Err(RealtimeError::Disconnected))
    }

    /// Registers an observer for every decoded payload.
    ///
    /// Opens the channel in the background if it is neither open nor opening.
    /// Failures of that background attempt are logged only; the observer simply
    /// receives nothing until the feed is reachable.
    ///
    /// The returned [`Subscription`] removes exactly this registration. Removing
    /// the last observer closes the transport.
    ///
    /// Observers run on the read task, once per payload, in registration order.
    /// A panicking observer is logged and does not affect the others.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.observers.insert(Arc::new(callback));
        tracing::debug!("Observer registered ({} total)", self.observers.len());

        let idle = !matches!(
            self.connection.state(),
            ConnectionState::Open | ConnectionState::Connecting
        );
        if idle && self.is_enabled() {
            let client = self.clone();
            spawn_detached(async move {
                match client.connect().await {
                    Ok(()) => {}
                    Err(e) if e.is_terminal() => {
                        tracing::error!("Background connection for subscriber failed: {}", e);
                    }
                    Err(e) => {
                        tracing::warn!("Background connection for subscriber failed: {}", e);
                    }
                }
            });
        }

        Subscription::new(id, self.clone())
    }

    /// Subscribes to `queue_update` payloads of one department
    pub fn subscribe_queue_updates<F>(&self, department_id: i64, callback: F) -> Subscription
    where
        F: Fn(QueueUpdate) + Send + Sync + 'static,
    {
        self.subscribe(move |payload| {
            if let Some(update) = QueueUpdate::from_payload(payload)
                && update.is_for_department(department_id)
            {
                callback(update);
            }
        })
    }

    /// Subscribes through a bounded channel instead of a callback.
    ///
    /// Payloads that do not fit in the buffer are dropped with a warning so a
    /// slow receiver never stalls the other observers.
    pub fn subscribe_channel(&self, buffer: usize) -> (Subscription, mpsc::Receiver<Value>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let subscription = self.subscribe(move |payload| {
            if let Err(e) = tx.try_send(payload.clone()) {
                tracing::warn!("Dropping payload for channel subscriber: {}", e);
            }
        });
        (subscription, rx)
    }

    /// [`subscribe_channel`](Self::subscribe_channel) with the default buffer
    pub fn messages(&self) -> (Subscription, mpsc::Receiver<Value>) {
        self.subscribe_channel(DEFAULT_SUBSCRIPTION_BUFFER)
    }

    /// Closes the channel and forgets every observer.
    ///
    /// Pending reconnects are cancelled and automatic reconnection stays off
    /// until the next [`connect`](Self::connect) or [`subscribe`](Self::subscribe).
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.was_manual_disconnect = true;
        state.cancel_sequence();
        state.reject_pending(|| RealtimeError::Disconnected);
        tracing::info!("Disconnecting from queue feed");

        if let Err(e) = self.connection.close().await {
            tracing::debug!("Close handshake failed: {}", e);
        }
        drop(state);

        self.observers.clear();
        tracing::info!("Disconnected from queue feed");
    }

    /// Checks whether the transport is currently open.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Receiver that observes every connection state transition
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Reconnect attempts made since the last successful open
    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.timer.attempts()
    }

    /// Whether automatic reconnection is suppressed by `disconnect()`
    pub async fn was_manual_disconnect(&self) -> bool {
        self.state.read().await.was_manual_disconnect
    }

    fn spawn_sequence(&self, state: &mut ClientState, url: String, delay: Option<Duration>) {
        state.sequence_active = true;
        let epoch = state.epoch;
        let client = self.clone();
        state
            .task_manager
            .spawn(client.run_sequence(url, epoch, delay));
    }

    /// Attempts to open the transport until it opens, the ceiling is reached,
    /// or the sequence is cancelled.
    fn run_sequence(
        self,
        url: String,
        epoch: u64,
        initial_delay: Option<Duration>,
    ) -> BoxFuture<'static, ()> {
        async move {
            let mut delay = initial_delay;
            loop {
                if let Some(wait) = delay.take() {
                    tracing::info!("Reconnecting in {:?}", wait);
                    time::sleep(wait).await;
                }

                {
                    let state = self.state.read().await;
                    if state.epoch != epoch {
                        return;
                    }
                    self.connection.set_state(ConnectionState::Connecting);
                }
                tracing::info!("Connecting to {}", url);

                let error = match self.factory.open(&url).await {
                    Ok(transport) => {
                        self.install(transport, epoch).await;
                        return;
                    }
                    Err(e) => e,
                };

                let mut state = self.state.write().await;
                if state.epoch != epoch {
                    return;
                }
                self.connection.set_state(ConnectionState::Closed);
                tracing::warn!("Connection attempt failed: {}", error);

                match state.timer.next_delay() {
                    Some(next) => delay = Some(next),
                    None => {
                        let attempts = state.timer.attempts();
                        tracing::error!(
                            "Giving up after {}/{} reconnect attempts",
                            attempts,
                            state.timer.max_attempts()
                        );
                        state.sequence_active = false;
                        state.reject_pending(|| RealtimeError::ConnectionExhausted { attempts });
                        return;
                    }
                }
            }
        }
        .boxed()
    }

    /// Takes ownership of a freshly opened transport and starts reading from it
    async fn install(&self, transport: Transport, epoch: u64) {
        let Transport { mut sink, frames } = transport;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            drop(state);
            tracing::debug!("Discarding transport opened for a cancelled sequence");
            if let Err(e) = sink.close().await {
                tracing::debug!("Failed to close discarded transport: {}", e);
            }
            return;
        }

        self.connection.set_writer(sink).await;
        state.timer.reset();
        state.sequence_active = false;
        self.connection.set_state(ConnectionState::Open);
        state.resolve_pending();

        let client = self.clone();
        state.task_manager.spawn(client.read_loop(frames, epoch));
        tracing::info!("Connected to queue feed");
    }

    fn read_loop(self, mut frames: FrameStream, epoch: u64) -> BoxFuture<'static, ()> {
        async move {
            tracing::info!("Starting read task");
            let router = MessageRouter::new(Arc::clone(&self.observers));

            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let text = text.as_str();
                        tracing::debug!("Received text message: {}", text);
                        router.route_text(text);
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(close_frame) = frame {
                            tracing::warn!(
                                "Server closed connection: code={:?}, reason='{}'",
                                close_frame.code,
                                close_frame.reason
                            );
                        } else {
                            tracing::warn!("Server closed connection without close frame");
                        }
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        tracing::debug!("Received ping ({} bytes)", data.len());
                    }
                    Ok(Message::Pong(data)) => {
                        tracing::debug!("Received pong ({} bytes)", data.len());
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::warn!("Dropping unexpected binary frame ({} bytes)", data.len());
                    }
                    Ok(Message::Frame(_)) => {
                        tracing::debug!("Received raw frame (internal)");
                    }
                    Err(e) => {
                        tracing::error!("WebSocket read error: {}", e);
                        break;
                    }
                }
            }

            self.handle_transport_lost(epoch).await;
            tracing::info!("Read task finished");
        }
        .boxed()
    }

    /// Open -> Closed without a deliberate close: retry or give up
    async fn handle_transport_lost(&self, epoch: u64) {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return;
        }

        self.connection.clear_writer().await;
        self.connection.set_state(ConnectionState::Closed);

        if state.was_manual_disconnect {
            return;
        }
        let Some(url) = self.endpoint.clone() else {
            return;
        };

        match state.timer.next_delay() {
            Some(delay) => {
                tracing::warn!("Connection lost, reconnecting in {:?}", delay);
                self.spawn_sequence(&mut state, url, Some(delay));
            }
            None => {
                let attempts = state.timer.attempts();
                tracing::error!(
                    "Connection lost and no reconnect attempts left ({} used)",
                    attempts
                );
                state.reject_pending(|| RealtimeError::ConnectionExhausted { attempts });
            }
        }
    }

    /// Tears the transport down once no observer is left.
    /// Leaves the manual flag alone so a later subscribe reopens.
    pub(crate) async fn release_if_idle(&self) {
        let mut state = self.state.write().await;
        if !self.observers.is_empty() {
            return;
        }
        if !state.sequence_active && !self.connection.has_writer().await {
            return;
        }

        tracing::info!("Last observer removed, closing queue feed");
        state.cancel_sequence();
        state.reject_pending(|| RealtimeError::Disconnected);

        if let Err(e) = self.connection.close().await {
            tracing::debug!("Close handshake failed: {}", e);
        }

        // Observers registered while closing still saw the old transport as open
        if !self.observers.is_empty()
            && !state.was_manual_disconnect
            && let Some(url) = self.endpoint.clone()
        {
            tracing::info!("Observer registered during teardown, reopening queue feed");
            self.spawn_sequence(&mut state, url, None);
        }
    }
}

/// Spawns onto the current Tokio runtime, or logs if there is none
pub(crate) fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            tracing::warn!("No Tokio runtime available, background task not started");
        }
    }
}

impl std::fmt::Debug for RealtimeFeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeFeedClient")
            .field("endpoint", &self.endpoint)
            .field("state", &self.connection.state())
            .field("observers", &self.observers.len())
            .finish()
    }
}
