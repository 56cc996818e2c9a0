//! # Shared State
//!
//! Thread-safe, string-keyed storage. One instance travels with every
//! [`Scope`](crate::protocol::Scope); applications keep another for
//! application-wide resources. Clones share the same underlying map.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Well-known key holding the dispatching `Arc<Router>`
pub const ROUTER_KEY: &str = "router";

/// Well-known key holding the application-wide `State`
pub const APP_KEY: &str = "app";

/// Thread-safe state container
///
/// Stores arbitrary typed values under string keys.
/// Cloning is cheap and clones share the same storage.
///
/// # Example
///
/// ```
/// use purr_core::State;
///
/// let state = State::new();
/// state.set("greeting", "hello".to_string());
/// assert_eq!(state.get::<String>("greeting").as_deref(), Some("hello"));
/// ```
#[derive(Clone, Default)]
pub struct State {
    /// Type-erased storage for named values
    data: Arc<RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>>,
}

impl State {
    /// Create a new empty state container
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value with a string key
    ///
    /// Overwrites any existing value with the same key.
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        let mut data = self.data.write().expect("State lock poisoned");
        data.insert(key.into(), Box::new(value));
    }

    /// Store a value only if the key is vacant
    ///
    /// Returns `true` when the value was stored.
    pub fn set_if_absent<T: Send + Sync + 'static>(&self, key: &str, value: T) -> bool {
        let mut data = self.data.write().expect("State lock poisoned");
        if data.contains_key(key) {
            return false;
        }
        data.insert(key.to_string(), Box::new(value));
        true
    }

    /// Get a cloned value by key
    ///
    /// Returns `None` if key doesn't exist or type doesn't match.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let data = self.data.read().expect("State lock poisoned");
        data.get(key)
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Check if a key exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let data = self.data.read().expect("State lock poisoned");
        data.contains_key(key)
    }

    /// Remove a value by key
    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write().expect("State lock poisoned");
        data.remove(key).is_some()
    }

    /// Get the number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        let data = self.data.read().expect("State lock poisoned");
        data.len()
    }

    /// Check if state is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read().expect("State lock poisoned");
        f.debug_struct("State")
            .field("keys", &data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_set_get() {
        let state = State::new();
        state.set("count", 42i32);
        state.set("name", "test".to_string());

        assert_eq!(state.get::<i32>("count"), Some(42));
        assert_eq!(state.get::<String>("name"), Some("test".to_string()));
    }

    #[test]
    fn test_state_type_mismatch() {
        let state = State::new();
        state.set("count", 42i32);

        assert_eq!(state.get::<String>("count"), None);
    }

    #[test]
    fn test_state_overwrite() {
        let state = State::new();
        state.set("value", 1i32);
        state.set("value", 2i32);

        assert_eq!(state.get::<i32>("value"), Some(2));
    }

    #[test]
    fn test_set_if_absent_keeps_first() {
        let state = State::new();
        assert!(state.set_if_absent("value", 1i32));
        assert!(!state.set_if_absent("value", 2i32));

        assert_eq!(state.get::<i32>("value"), Some(1));
    }

    #[test]
    fn test_state_remove_and_len() {
        let state = State::new();
        assert!(state.is_empty());

        state.set("key", "value".to_string());
        state.set("other", 2i32);
        assert_eq!(state.len(), 2);

        assert!(state.remove("key"));
        assert!(!state.contains("key"));
        assert!(!state.remove("key"));
    }

    #[test]
    fn test_clones_share_storage() {
        use std::thread;

        let state = State::new();
        let state_clone = state.clone();

        let handle = thread::spawn(move || {
            state_clone.set("thread", 123i32);
        });

        handle.join().unwrap();
        assert_eq!(state.get::<i32>("thread"), Some(123));
    }
}
