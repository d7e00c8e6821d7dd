use super::RealtimeFeedClient;
use super::core::spawn_detached;
use crate::messaging::ObserverId;

/// Handle returned by [`RealtimeFeedClient::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    id: ObserverId,
    client: RealtimeFeedClient,
}

impl Subscription {
    pub(crate) fn new(id: ObserverId, client: RealtimeFeedClient) -> Self {
        Self { id, client }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Whether this registration is still in the observer registry
    pub fn is_active(&self) -> bool {
        self.client.observers.contains(self.id)
    }

    /// Removes this registration. Calling it again is a no-op.
    ///
    /// When this was the last observer the transport is closed in the
    /// background; a later subscribe opens it again.
    pub fn unsubscribe(&self) {
        if !self.client.observers.remove(self.id) {
            return;
        }
        tracing::debug!(
            "Observer {:?} removed ({} remaining)",
            self.id(),
            self.client.observers.len()
        );

        if self.client.observers.is_empty() {
            let client = self.client.clone();
            spawn_detached(async move { client.release_if_idle().await });
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
