use crate::infrastructure::{TaskManager, Timer};
use crate::types::{RealtimeError, Result};
use tokio::sync::oneshot;

/// Consolidated mutable state for RealtimeFeedClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Reconnect attempt counter and backoff policy
    pub timer: Timer,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// A connection sequence (attempt or scheduled retry) is in flight
    pub sequence_active: bool,

    /// Bumped on every deliberate teardown; stale tasks compare against it
    pub epoch: u64,

    /// `connect()` callers waiting on the current sequence
    pub pending_connects: Vec<oneshot::Sender<Result<()>>>,

    /// Background task manager (read loop, retries)
    pub task_manager: TaskManager,
}

impl ClientState {
    pub fn new(timer: Timer) -> Self {
        Self {
            timer,
            was_manual_disconnect: false,
            sequence_active: false,
            epoch: 0,
            pending_connects: Vec::new(),
            task_manager: TaskManager::new(),
        }
    }

    /// Resolve every waiting `connect()` call
    pub fn resolve_pending(&mut self) {
        for waiter in self.pending_connects.drain(..) {
            let _ = waiter.send(Ok(()));
        }
    }

    /// Reject every waiting `connect()` call with a fresh error per caller
    pub fn reject_pending(&mut self, make_error: impl Fn() -> RealtimeError) {
        for waiter in self.pending_connects.drain(..) {
            let _ = waiter.send(Err(make_error()));
        }
    }

    /// Cancel the current sequence: invalidate stale tasks and abort timers
    pub fn cancel_sequence(&mut self) {
        tracing::debug!(
            "Cancelling connection sequence ({} background task(s))",
            self.task_manager.active()
        );
        self.epoch += 1;
        self.sequence_active = false;
        self.task_manager.abort_all();
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Timer::default())
    }
}
