//! Watchers for prop and state keys
//!
//! Per-key ordered callback lists. Callbacks fire in registration order,
//! once per changed key, with `(new, old)`, and always before the
//! `before_update` hook of the change that triggered them.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::constants::WATCHERS_PER_KEY_COUNT_MAX;

/// Callback invoked with `(new_value, old_value)` when a watched key changes
pub type WatcherCallback = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

struct WatcherEntry {
    id: u64,
    callback: WatcherCallback,
}

type WatcherMap = HashMap<String, Vec<WatcherEntry>>;

/// Ordered watcher subscriptions for one map (props or state)
///
/// Cheap to clone; clones share the same subscriptions.
#[derive(Clone, Default)]
pub struct WatcherSet {
    inner: Arc<Mutex<WatcherMap>>,
    next_id: Arc<Mutex<u64>>,
}

impl WatcherSet {
    /// Create an empty watcher set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a key, returning a cancellation handle
    pub fn watch(&self, key: impl Into<String>, callback: WatcherCallback) -> WatcherHandle {
        let key = key.into();
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };

        let mut map = self.inner.lock().unwrap();
        let entries = map.entry(key.clone()).or_default();
        debug_assert!(entries.len() < WATCHERS_PER_KEY_COUNT_MAX);
        entries.push(WatcherEntry { id, callback });

        WatcherHandle {
            inner: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Invoke every callback registered for a key, in registration order
    pub fn notify(&self, key: &str, new: &Value, old: &Value) {
        // Snapshot outside the lock so a callback may cancel itself or
        // register another watcher without deadlocking.
        let callbacks: Vec<WatcherCallback> = {
            let map = self.inner.lock().unwrap();
            match map.get(key) {
                Some(entries) => entries.iter().map(|e| e.callback.clone()).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            callback(new, old);
        }
    }

    /// Number of callbacks registered for a key
    pub fn count_for_key(&self, key: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(key)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Total callbacks across all keys
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().values().map(|v| v.len()).sum()
    }

    /// Whether no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

/// Handle returned by [`WatcherSet::watch`]
///
/// `cancel` removes exactly the callback this handle was created for.
/// Calling it twice is a no-op the second time.
pub struct WatcherHandle {
    inner: Weak<Mutex<WatcherMap>>,
    key: String,
    id: u64,
}

impl WatcherHandle {
    /// Remove the associated callback from its key's list
    pub fn cancel(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut map = inner.lock().unwrap();
        if let Some(entries) = map.get_mut(&self.key) {
            entries.retain(|entry| entry.id != self.id);
            if entries.is_empty() {
                map.remove(&self.key);
            }
        }
    }

    /// The key this handle watches
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recording_callback(log: Arc<Mutex<Vec<String>>>, label: &str) -> WatcherCallback {
        let label = label.to_string();
        Arc::new(move |new, old| {
            log.lock()
                .unwrap()
                .push(format!("{}:{}<-{}", label, new, old));
        })
    }

    #[test]
    fn test_notify_in_registration_order() {
        let set = WatcherSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        set.watch("count", recording_callback(log.clone(), "a"));
        set.watch("count", recording_callback(log.clone(), "b"));

        set.notify("count", &json!(2), &json!(1));

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec!["a:2<-1", "b:2<-1"]);
    }

    #[test]
    fn test_notify_unwatched_key_is_noop() {
        let set = WatcherSet::new();
        set.notify("missing", &json!(1), &json!(0));
        assert!(set.is_empty());
    }

    #[test]
    fn test_cancel_removes_exactly_one() {
        let set = WatcherSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = set.watch("count", recording_callback(log.clone(), "a"));
        set.watch("count", recording_callback(log.clone(), "b"));

        handle.cancel();
        set.notify("count", &json!(5), &json!(0));

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec!["b:5<-0"]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let set = WatcherSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = set.watch("count", recording_callback(log.clone(), "a"));
        set.watch("count", recording_callback(log.clone(), "b"));

        handle.cancel();
        handle.cancel();

        assert_eq!(set.count_for_key("count"), 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let set = WatcherSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        set.watch("a", recording_callback(log.clone(), "a"));
        set.watch("b", recording_callback(log.clone(), "b"));
        assert_eq!(set.len(), 2);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_callback_may_cancel_during_notify() {
        let set = WatcherSet::new();
        let slot: Arc<Mutex<Option<WatcherHandle>>> = Arc::new(Mutex::new(None));

        let slot_clone = slot.clone();
        let handle = set.watch(
            "count",
            Arc::new(move |_new, _old| {
                if let Some(h) = slot_clone.lock().unwrap().take() {
                    h.cancel();
                }
            }),
        );
        *slot.lock().unwrap() = Some(handle);

        set.notify("count", &json!(1), &json!(0));
        assert_eq!(set.count_for_key("count"), 0);
    }
}
