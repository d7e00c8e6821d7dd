// Module declarations
mod builder;
mod connection;
mod core;
mod state;
mod subscription;

// Public API exports
pub use builder::{FeedClientBuilder, FeedClientOptions, resolve_endpoint};
pub use connection::{ConnectionManager, ConnectionState};
pub use self::core::RealtimeFeedClient;
pub use state::ClientState;
pub use subscription::Subscription;
