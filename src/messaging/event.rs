use crate::types::constants::{EVENT_TYPE_FIELD, feed_events};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Type-safe feed events (the `type` discriminator of a payload)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedEvent {
    /// Department queue snapshot
    QueueUpdate,

    /// Any other server-defined event
    Custom(String),
}

impl FeedEvent {
    /// Parse a string into a FeedEvent
    pub fn from_str(s: &str) -> Self {
        match s {
            feed_events::QUEUE_UPDATE => Self::QueueUpdate,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Convert event to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::QueueUpdate => feed_events::QUEUE_UPDATE,
            Self::Custom(s) => s,
        }
    }

    /// Reads the event discriminator of a decoded payload, if it has one
    pub fn of_payload(payload: &Value) -> Option<Self> {
        payload
            .get(EVENT_TYPE_FIELD)
            .and_then(Value::as_str)
            .map(Self::from_str)
    }
}

impl From<&str> for FeedEvent {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for FeedEvent {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl std::fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FeedEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeedEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_str(&s))
    }
}
