//! # Queue Realtime
//!
//! Reconnecting real-time feed client for hospital queue dashboards.
//!
//! A [`RealtimeFeedClient`] keeps one WebSocket subscription to the queue
//! channel (`<base>/queue`), reconnects with exponential backoff when it
//! drops, and fans decoded payloads out to every registered observer. Views
//! seed their initial state through [`QueueApi`] and fall back to
//! [`demo_queue`] snapshots when the backend is unreachable.
//!
//! ## Example
//!
//! ```no_run
//! use queue_realtime_rs::{FeedClientOptions, RealtimeFeedClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeFeedClient::new("wss://hospital.example/ws", FeedClientOptions::default())?;
//!
//!     let cardiology = client.subscribe_queue_updates(4, |update| {
//!         println!("{} patients waiting", update.queue.len());
//!     });
//!
//!     client.connect().await?;
//!     tokio::signal::ctrl_c().await?;
//!
//!     cardiology.unsubscribe();
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use client::{
    ConnectionState, FeedClientBuilder, FeedClientOptions, RealtimeFeedClient, Subscription,
};
pub use infrastructure::{QueueApi, demo_queue, demo_statistics, ws_to_http_endpoint};
pub use messaging::{FeedEvent, ObserverId};
pub use types::{
    QueueItem, QueueStatistics, QueueUpdate, RealtimeError, Result, ServiceInfo,
};
pub use websocket::{Transport, TransportFactory, WebSocketFactory};
