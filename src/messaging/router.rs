use super::ObserverRegistry;
use crate::types::{RealtimeError, Result};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Decodes inbound frames and fans payloads out to observers
pub struct MessageRouter {
    observers: Arc<ObserverRegistry>,
}

impl MessageRouter {
    pub fn new(observers: Arc<ObserverRegistry>) -> Self {
        Self { observers }
    }

    /// Decodes one text frame. Only a single JSON object is a valid payload.
    pub fn decode(text: &str) -> Result<Value> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RealtimeError::Decode(e.to_string()))?;
        if !value.is_object() {
            return Err(RealtimeError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }
        Ok(value)
    }

    /// Decodes a text frame and routes it. Malformed frames are logged and dropped.
    /// Returns the number of observers that received the payload.
    pub fn route_text(&self, text: &str) -> usize {
        match Self::decode(text) {
            Ok(payload) => self.route(&payload),
            Err(e) => {
                tracing::warn!("Dropping undecodable frame: {} - Raw: {}", e, text);
                0
            }
        }
    }

    /// Invokes every registered observer once, in registration order.
    ///
    /// Iterates over a snapshot, so observers may subscribe or unsubscribe
    /// while being called. A panicking observer is logged and skipped.
    pub fn route(&self, payload: &Value) -> usize {
        let observers = self.observers.snapshot();
        tracing::debug!("Routing payload to {} observer(s)", observers.len());

        let mut delivered = 0;
        for (index, observer) in observers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| observer(payload))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    tracing::error!(
                        "Observer #{} panicked during fan-out: {}",
                        index,
                        panic_message(cause.as_ref())
                    );
                }
            }
        }
        delivered
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recording(
        registry: &ObserverRegistry,
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
    ) {
        let log = Arc::clone(log);
        registry.insert(Arc::new(move |_: &Value| log.lock().unwrap().push(name)));
    }

    fn crashing_view(_: &Value) {
        panic!("view crashed");
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let registry = Arc::new(ObserverRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&registry, &log, "o1");
        recording(&registry, &log, "o2");
        recording(&registry, &log, "o3");

        let router = MessageRouter::new(Arc::clone(&registry));
        let delivered = router.route_text(r#"{"type":"queue_update","department_id":1,"queue":[]}"#);

        assert_eq!(delivered, 3);
        assert_eq!(*log.lock().unwrap(), vec!["o1", "o2", "o3"]);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_siblings() {
        let registry = Arc::new(ObserverRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&registry, &log, "o1");
        registry.insert(Arc::new(crashing_view));
        recording(&registry, &log, "o3");

        let router = MessageRouter::new(Arc::clone(&registry));
        let delivered = router.route(&json!({ "type": "queue_update" }));

        assert_eq!(delivered, 2);
        assert_eq!(*log.lock().unwrap(), vec!["o1", "o3"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_undecodable_frames_reach_nobody() {
        let registry = Arc::new(ObserverRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&registry, &log, "o1");
        let router = MessageRouter::new(Arc::clone(&registry));

        assert_eq!(router.route_text("{not json"), 0);
        assert_eq!(router.route_text("[1,2,3]"), 0);
        assert_eq!(router.route_text("\"queue_update\""), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_observer_may_unsubscribe_during_fan_out() {
        let registry = Arc::new(ObserverRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let registry_for_observer = Arc::clone(&registry);
        let log_for_observer = Arc::clone(&log);
        let self_id = Arc::new(Mutex::new(None));
        let self_id_for_observer = Arc::clone(&self_id);
        let id = registry.insert(Arc::new(move |_: &Value| {
            log_for_observer.lock().unwrap().push("once");
            if let Some(id) = *self_id_for_observer.lock().unwrap() {
                registry_for_observer.remove(id);
            }
        }));
        *self_id.lock().unwrap() = Some(id);
        recording(&registry, &log, "always");

        let router = MessageRouter::new(Arc::clone(&registry));
        router.route(&json!({}));
        router.route(&json!({}));

        assert_eq!(*log.lock().unwrap(), vec!["once", "always", "always"]);
    }

    #[test]
    fn test_decode_errors_are_decode_variant() {
        assert!(matches!(
            MessageRouter::decode("nope"),
            Err(RealtimeError::Decode(_))
        ));
        assert!(MessageRouter::decode(r#"{"type":"x"}"#).is_ok());
    }
}
