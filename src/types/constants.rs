/// Environment variable holding the socket base address
pub const ENDPOINT_ENV_VAR: &str = "QUEUE_WS_URL";

/// Path appended to the base address to reach the queue channel
pub const QUEUE_CHANNEL_PATH: &str = "queue";

/// Feed event discriminators (the `type` field of a payload)
pub mod feed_events {
    pub const QUEUE_UPDATE: &str = "queue_update";
}

/// Payload field carrying the event discriminator
pub const EVENT_TYPE_FIELD: &str = "type";

/// Default maximum reconnect attempts before giving up
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default base delay for exponential backoff (milliseconds)
pub const DEFAULT_RECONNECT_BASE_DELAY: u64 = 1000;

/// Default buffer for channel-backed subscriptions
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 100;

/// Default HTTP timeout for the REST collaborator (milliseconds)
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10000;
