use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked with every decoded inbound payload
pub type Observer = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

/// Identity of one registration; unique per registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct RegistryInner {
    next_id: u64,
    observers: Vec<(ObserverId, Observer)>,
}

/// Ordered observer registry.
///
/// Insertion order is delivery order. Registering the same callback twice
/// yields two independent entries with distinct ids.
pub struct ObserverRegistry {
    inner: Mutex<RegistryInner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 0,
                observers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // Observers never run under this lock, so a poisoned guard still holds a valid list
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an observer and returns its id
    pub fn insert(&self, observer: Observer) -> ObserverId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = ObserverId(inner.next_id);
        inner.observers.push((id, observer));
        id
    }

    /// Removes exactly the registration with this id.
    /// Returns false if it was already removed.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(existing, _)| *existing != id);
        inner.observers.len() != before
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.lock().observers.iter().any(|(existing, _)| *existing == id)
    }

    /// Copy of the current observers, in registration order
    pub fn snapshot(&self) -> Vec<Observer> {
        self.lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().observers.is_empty()
    }

    pub fn clear(&self) {
        self.lock().observers.clear();
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Observer {
        Arc::new(|_: &Value| {})
    }

    #[test]
    fn test_remove_only_the_given_registration() {
        let registry = ObserverRegistry::new();
        let shared = noop();
        let first = registry.insert(Arc::clone(&shared));
        let second = registry.insert(shared);
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(first));
        assert!(!registry.contains(first));
        assert!(registry.contains(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let registry = ObserverRegistry::new();
        let id = registry.insert(noop());
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = ObserverRegistry::new();
        registry.insert(noop());
        registry.insert(noop());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }
}
