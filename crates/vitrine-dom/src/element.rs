//! In-memory host elements

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use vitrine_core::host::{HostElement, UiEvent, UiListener};

/// An element in the in-memory document
///
/// Content is a flat markup string; listener lists are discarded whenever the
/// content is replaced, matching how replacing real markup drops the
/// listeners that were attached to it.
pub struct MemoryElement {
    id: String,
    attached: AtomicBool,
    inner_html: Mutex<String>,
    listeners: Mutex<HashMap<String, Vec<UiListener>>>,
}

impl MemoryElement {
    /// Create an element, attached or detached
    pub fn new(id: impl Into<String>, attached: bool) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            attached: AtomicBool::new(attached),
            inner_html: Mutex::new(String::new()),
            listeners: Mutex::new(HashMap::new()),
        })
    }

    /// Number of listeners currently attached, across all event names
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().values().map(|v| v.len()).sum()
    }
}

impl HostElement for MemoryElement {
    fn element_id(&self) -> &str {
        &self.id
    }

    fn inner_html(&self) -> String {
        self.inner_html.lock().unwrap().clone()
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    fn replace_content(&self, markup: &str) {
        *self.inner_html.lock().unwrap() = markup.to_string();
        self.listeners.lock().unwrap().clear();
    }

    fn add_listener(&self, event: &str, listener: UiListener) {
        self.listeners
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    fn clear_listeners(&self) {
        self.listeners.lock().unwrap().clear();
    }

    fn dispatch(&self, event: &UiEvent) -> usize {
        // Snapshot so a listener may mutate the listener list.
        let listeners: Vec<UiListener> = {
            let map = self.listeners.lock().unwrap();
            match map.get(&event.name) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_content_discards_listeners() {
        let element = MemoryElement::new("panel", true);
        element.add_listener("click", Arc::new(|_| {}));
        assert_eq!(element.listener_count(), 1);

        element.replace_content("<div>fresh</div>");
        assert_eq!(element.listener_count(), 0);
        assert_eq!(element.inner_html(), "<div>fresh</div>");
    }

    #[test]
    fn test_dispatch_counts_listeners() {
        let element = MemoryElement::new("panel", true);
        let hits = Arc::new(Mutex::new(0usize));

        let hits_clone = hits.clone();
        element.add_listener(
            "refresh",
            Arc::new(move |_| {
                *hits_clone.lock().unwrap() += 1;
            }),
        );

        let delivered = element.dispatch(&UiEvent::new("refresh", json!(null)));
        assert_eq!(delivered, 1);
        assert_eq!(*hits.lock().unwrap(), 1);

        let missed = element.dispatch(&UiEvent::new("other", json!(null)));
        assert_eq!(missed, 0);
    }

    #[test]
    fn test_detach() {
        let element = MemoryElement::new("panel", true);
        assert!(element.is_attached());
        element.detach();
        assert!(!element.is_attached());
    }
}
