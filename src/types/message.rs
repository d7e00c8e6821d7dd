use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::messaging::FeedEvent;

/// One patient entry in a department queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueItem {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u32>,
    /// Fields the server sends that this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueueItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ticket_number: None,
            patient_name: None,
            service_id: None,
            status: None,
            priority: None,
            position: None,
            estimated_wait_minutes: None,
            extra: Map::new(),
        }
    }
}

/// The `queue_update` payload pushed on the queue channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueUpdate {
    #[serde(rename = "type")]
    pub event: FeedEvent,
    pub department_id: i64,
    #[serde(default)]
    pub queue: Vec<QueueItem>,
}

impl QueueUpdate {
    pub fn new(department_id: i64, queue: Vec<QueueItem>) -> Self {
        Self {
            event: FeedEvent::QueueUpdate,
            department_id,
            queue,
        }
    }

    /// Interprets a decoded payload as a queue update.
    ///
    /// Returns `None` for other event types and for queue updates that do not
    /// match the expected shape.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        if FeedEvent::of_payload(payload)? != FeedEvent::QueueUpdate {
            return None;
        }
        match serde_json::from_value::<QueueUpdate>(payload.clone()) {
            Ok(update) => Some(update),
            Err(e) => {
                tracing::warn!("Malformed queue_update payload: {}", e);
                None
            }
        }
    }

    pub fn is_for_department(&self, department_id: i64) -> bool {
        self.department_id == department_id
    }
}

/// A hospital service patients can register for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Per-department counters shown on the analytics dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DepartmentStatistics {
    pub department_id: i64,
    pub waiting: u32,
    pub served: u32,
    pub average_wait_minutes: f64,
}

/// Aggregate queue statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueStatistics {
    pub total_waiting: u32,
    pub total_served: u32,
    pub average_wait_minutes: f64,
    pub departments: Vec<DepartmentStatistics>,
}
