use crate::types::{RealtimeError, Result};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Sink, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Write half of an open transport
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Read half of an open transport
pub type FrameStream = BoxStream<'static, std::result::Result<Message, WsError>>;

/// An open transport handle, split into its write and read halves
pub struct Transport {
    pub sink: FrameSink,
    pub frames: FrameStream,
}

impl Transport {
    pub fn new(sink: FrameSink, frames: FrameStream) -> Self {
        Self { sink, frames }
    }
}

/// Opens transports to the channel endpoint.
///
/// The returned future resolves once the transport is open, or fails with
/// [`RealtimeError::TransportOpen`].
pub trait TransportFactory: Send + Sync + 'static {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<Transport>>;
}

/// WebSocket factory for creating WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

impl TransportFactory for WebSocketFactory {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<Transport>> {
        let url = url.to_string();
        async move {
            tracing::debug!("Creating WebSocket connection to: {}", url);
            let (ws_stream, _response) = connect_async(url.as_str())
                .await
                .map_err(|e| RealtimeError::TransportOpen(e.to_string()))?;
            let (write_half, read_half) = ws_stream.split();
            Ok(Transport::new(Box::pin(write_half), read_half.boxed()))
        }
        .boxed()
    }
}
