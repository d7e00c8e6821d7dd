use super::{ClientState, ConnectionManager, RealtimeFeedClient};
use crate::infrastructure::Timer;
use crate::messaging::ObserverRegistry;
use crate::types::{
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY, ENDPOINT_ENV_VAR,
    QUEUE_CHANNEL_PATH, RealtimeError, Result,
};
use crate::websocket::{TransportFactory, WebSocketFactory};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct FeedClientOptions {
    /// Retries after a failed or lost connection before giving up. Default: 5.
    pub max_reconnect_attempts: Option<u32>,
    /// Base of the exponential backoff, in milliseconds. Default: 1000.
    pub reconnect_base_delay: Option<u64>,
    /// Upper bound for a single backoff delay, in milliseconds. Default: uncapped.
    pub max_reconnect_delay: Option<u64>,
}

impl FeedClientOptions {
    pub(crate) fn timer(&self) -> Timer {
        Timer::new(
            self.reconnect_base_delay
                .unwrap_or(DEFAULT_RECONNECT_BASE_DELAY),
            self.max_reconnect_attempts
                .unwrap_or(DEFAULT_MAX_RECONNECT_ATTEMPTS),
        )
        .with_max_delay(self.max_reconnect_delay)
    }
}

/// Builder for RealtimeFeedClient that resolves the channel endpoint
pub struct FeedClientBuilder {
    endpoint: Option<String>,
    options: FeedClientOptions,
    factory: Arc<dyn TransportFactory>,
}

impl FeedClientBuilder {
    /// Create a new builder from the socket base address.
    ///
    /// An empty base disables the channel: the client can be built and
    /// subscribed to, but `connect()` fails with a configuration error.
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let endpoint = resolve_endpoint(&base.into())?;
        if endpoint.is_none() {
            tracing::info!("No queue feed base address configured, realtime updates disabled");
        }

        Ok(Self {
            endpoint,
            options: FeedClientOptions::default(),
            factory: Arc::new(WebSocketFactory),
        })
    }

    /// Create a builder from the `QUEUE_WS_URL` environment variable
    pub fn from_env() -> Result<Self> {
        let base = std::env::var(ENDPOINT_ENV_VAR).unwrap_or_default();
        Self::new(base)
    }

    pub fn options(mut self, options: FeedClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the transport (defaults to [`WebSocketFactory`])
    pub fn transport(mut self, factory: impl TransportFactory) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Build the client. Nothing is spawned until the first connect or subscribe.
    pub fn build(self) -> RealtimeFeedClient {
        let client_state = ClientState::new(self.options.timer());

        RealtimeFeedClient {
            endpoint: self.endpoint,
            options: self.options,
            factory: self.factory,
            connection: Arc::new(ConnectionManager::new()),
            observers: Arc::new(ObserverRegistry::new()),
            state: Arc::new(RwLock::new(client_state)),
        }
    }
}

/// Resolves `<base>/queue`, or `None` when the base is empty
pub fn resolve_endpoint(base: &str) -> Result<Option<String>> {
    let base = base.trim();
    if base.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(&format!(
        "{}/{}",
        base.trim_end_matches('/'),
        QUEUE_CHANNEL_PATH
    ))?;

    match url.scheme() {
        "ws" | "wss" => Ok(Some(url.to_string())),
        other => Err(RealtimeError::Configuration(format!(
            "unsupported scheme '{}' for queue feed, expected ws or wss",
            other
        ))),
    }
}
