use thiserror::Error;

/// Errors that can occur when using the queue feed client.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// No channel endpoint configured; the feed is disabled for this client
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failed to open, or closed before reaching the open state
    #[error("Transport open error: {0}")]
    TransportOpen(String),

    /// Retry ceiling reached without a successful open
    #[error("Connection exhausted after {attempts} reconnect attempts")]
    ConnectionExhausted { attempts: u32 },

    /// Connection sequence cancelled by `disconnect()` or observer teardown
    #[error("Disconnected")]
    Disconnected,

    /// Inbound frame could not be decoded (internal, never surfaced to observers)
    #[error("Decode error: {0}")]
    Decode(String),

    /// WebSocket protocol error (send/close on an established transport)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// HTTP request error from the REST collaborator
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// REST endpoint answered with a non-success status
    #[error("API error: {url} returned status {status}")]
    Api { status: u16, url: String },

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl RealtimeError {
    /// True for failures that stop retrying without caller action
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::ConnectionExhausted { .. }
        )
    }
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
