use crate::types::error::Result;
use crate::websocket::FrameSink;
use futures::SinkExt;
use tokio::sync::{Mutex, watch};

/// Lifecycle of the single logical channel connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Owns the transport write half and publishes connection state
pub struct ConnectionManager {
    writer: Mutex<Option<FrameSink>>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            writer: Mutex::new(None),
            state,
        }
    }

    /// Sets the transport write sink (called after successful open)
    pub async fn set_writer(&self, writer: FrameSink) {
        let mut ws = self.writer.lock().await;
        *ws = Some(writer);
    }

    /// Whether a transport handle is currently held
    pub async fn has_writer(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Gets the current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Sets the connection state and notifies watchers
    pub fn set_state(&self, new_state: ConnectionState) {
        let previous = self.state.send_replace(new_state);
        if previous != new_state {
            tracing::debug!("Connection state {:?} -> {:?}", previous, new_state);
        }
    }

    /// Receiver that observes every state transition
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Checks if currently connected
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Closes the transport gracefully. Always ends in `Closed`.
    pub async fn close(&self) -> Result<()> {
        let mut ws_guard = self.writer.lock().await;
        let Some(mut ws) = ws_guard.take() else {
            self.set_state(ConnectionState::Closed);
            return Ok(());
        };

        self.set_state(ConnectionState::Closing);
        let result = ws.close().await;
        self.set_state(ConnectionState::Closed);

        result.map_err(Into::into)
    }

    /// Drops the transport handle without a close handshake (transport already gone)
    pub async fn clear_writer(&self) {
        let mut ws = self.writer.lock().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
