//! Global store
//!
//! A process-wide publish/subscribe key-value state container. The runtime
//! only consumes the `subscribe` contract; who mutates the store and under
//! what discipline is the embedding application's business.

use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

use crate::constants::STORE_SUBSCRIBERS_COUNT_MAX;

/// Store state snapshot type
pub type StoreState = Map<String, Value>;

/// Payload delivered to store subscribers
#[derive(Debug, Clone)]
pub struct StoreChange {
    /// State after the mutation
    pub new_state: StoreState,
    /// State before the mutation
    pub prev_state: StoreState,
}

/// Callback invoked synchronously on every store mutation
pub type StoreCallback = Arc<dyn Fn(&StoreChange) + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: StoreCallback,
}

type SubscriberList = Vec<Subscriber>;

/// Process-wide publish/subscribe state container
///
/// Created once at process start (or per test), mutated by arbitrary
/// callers, read by subscribers.
#[derive(Default)]
pub struct GlobalStore {
    state: Mutex<StoreState>,
    subscribers: Arc<Mutex<SubscriberList>>,
    next_id: Mutex<u64>,
}

impl GlobalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for a key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().get(key).cloned()
    }

    /// Snapshot of the full state
    pub fn snapshot(&self) -> StoreState {
        self.state.lock().unwrap().clone()
    }

    /// Set a key, notifying subscribers synchronously
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let change = {
            let mut state = self.state.lock().unwrap();
            let prev_state = state.clone();
            state.insert(key, value);
            StoreChange {
                new_state: state.clone(),
                prev_state,
            }
        };
        self.notify(&change);
    }

    /// Remove a key, notifying subscribers synchronously
    pub fn remove(&self, key: &str) {
        let change = {
            let mut state = self.state.lock().unwrap();
            if !state.contains_key(key) {
                return;
            }
            let prev_state = state.clone();
            state.remove(key);
            StoreChange {
                new_state: state.clone(),
                prev_state,
            }
        };
        self.notify(&change);
    }

    /// Register a subscriber, returning an unsubscribe guard
    pub fn subscribe(&self, callback: StoreCallback) -> StoreSubscription {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };

        let mut subscribers = self.subscribers.lock().unwrap();
        debug_assert!(subscribers.len() < STORE_SUBSCRIBERS_COUNT_MAX);
        subscribers.push(Subscriber { id, callback });
        debug!(subscriber_id = id, "store subscriber registered");

        StoreSubscription {
            subscribers: Arc::downgrade(&self.subscribers),
            id,
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    fn notify(&self, change: &StoreChange) {
        // Snapshot so a callback may unsubscribe without deadlocking.
        let callbacks: Vec<StoreCallback> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers.iter().map(|s| s.callback.clone()).collect()
        };
        for callback in callbacks {
            callback(change);
        }
    }
}

/// Guard returned by [`GlobalStore::subscribe`]
///
/// Unsubscribes on `cancel` or drop; `cancel` is idempotent.
pub struct StoreSubscription {
    subscribers: Weak<Mutex<SubscriberList>>,
    id: u64,
}

impl StoreSubscription {
    /// Remove this subscription from the store
    pub fn cancel(&self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .lock()
                .unwrap()
                .retain(|subscriber| subscriber.id != self.id);
        }
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let store = GlobalStore::new();
        store.set("theme", json!("dark"));
        assert_eq!(store.get("theme"), Some(json!("dark")));
    }

    #[test]
    fn test_subscriber_sees_new_and_prev() {
        let store = GlobalStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = store.subscribe(Arc::new(move |change| {
            seen_clone.lock().unwrap().push(change.clone());
        }));

        store.set("count", json!(1));
        store.set("count", json!(2));

        let changes = seen.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].prev_state.get("count"), None);
        assert_eq!(changes[0].new_state["count"], json!(1));
        assert_eq!(changes[1].prev_state["count"], json!(1));
        assert_eq!(changes[1].new_state["count"], json!(2));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let store = GlobalStore::new();
        let sub = store.subscribe(Arc::new(|_| {}));
        assert_eq!(store.subscriber_count(), 1);

        sub.cancel();
        sub.cancel();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = GlobalStore::new();
        {
            let _sub = store.subscribe(Arc::new(|_| {}));
            assert_eq!(store.subscriber_count(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_remove_missing_key_does_not_notify() {
        let store = GlobalStore::new();
        let fired = Arc::new(Mutex::new(0usize));

        let fired_clone = fired.clone();
        let _sub = store.subscribe(Arc::new(move |_| {
            *fired_clone.lock().unwrap() += 1;
        }));

        store.remove("absent");
        assert_eq!(*fired.lock().unwrap(), 0);
    }
}
