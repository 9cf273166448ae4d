//! Named element refs
//!
//! A name-keyed handle map to rendered elements, refreshed by the
//! component's `cache_elements` hook after every render. Refs reflect only
//! the most recent render; the map is overwritten in place, never versioned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::constants::REFS_COUNT_MAX;
use crate::host::ElementRef;

type RefEntries = HashMap<String, ElementRef>;

/// Name-to-element associations for one instance
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone, Default)]
pub struct RefMap {
    inner: Arc<Mutex<RefEntries>>,
}

impl RefMap {
    /// Create an empty ref map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a setter for the named ref
    ///
    /// The render pass hands the setter an element (stores the association)
    /// or `None` (removes it).
    pub fn create_ref(&self, name: impl Into<String>) -> RefSetter {
        RefSetter {
            inner: Arc::downgrade(&self.inner),
            name: name.into(),
        }
    }

    /// Look up the named ref
    pub fn get_ref(&self, name: &str) -> Option<ElementRef> {
        self.inner.lock().unwrap().get(name).cloned()
    }

    /// Number of stored associations
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether no associations are stored
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Drop every association
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

/// Setter callback produced by [`RefMap::create_ref`]
pub struct RefSetter {
    inner: Weak<Mutex<RefEntries>>,
    name: String,
}

impl RefSetter {
    /// Store or remove the association for this setter's name
    pub fn set(&self, element: Option<ElementRef>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut entries = inner.lock().unwrap();
        match element {
            Some(element) => {
                debug_assert!(entries.len() < REFS_COUNT_MAX);
                entries.insert(self.name.clone(), element);
            }
            None => {
                entries.remove(&self.name);
            }
        }
    }

    /// The name this setter writes to
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostElement, UiEvent, UiListener};

    struct FakeElement {
        id: String,
    }

    impl HostElement for FakeElement {
        fn element_id(&self) -> &str {
            &self.id
        }
        fn inner_html(&self) -> String {
            String::new()
        }
        fn is_attached(&self) -> bool {
            true
        }
        fn detach(&self) {}
        fn replace_content(&self, _markup: &str) {}
        fn add_listener(&self, _event: &str, _listener: UiListener) {}
        fn clear_listeners(&self) {}
        fn dispatch(&self, _event: &UiEvent) -> usize {
            0
        }
    }

    fn fake_element(id: &str) -> ElementRef {
        Arc::new(FakeElement { id: id.into() })
    }

    #[test]
    fn test_set_and_get() {
        let refs = RefMap::new();
        let setter = refs.create_ref("submit-button");

        setter.set(Some(fake_element("btn-1")));
        assert_eq!(refs.get_ref("submit-button").unwrap().element_id(), "btn-1");
    }

    #[test]
    fn test_set_none_removes() {
        let refs = RefMap::new();
        let setter = refs.create_ref("panel");

        setter.set(Some(fake_element("p-1")));
        setter.set(None);
        assert!(refs.get_ref("panel").is_none());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let refs = RefMap::new();
        let setter = refs.create_ref("panel");

        setter.set(Some(fake_element("old")));
        setter.set(Some(fake_element("new")));

        assert_eq!(refs.len(), 1);
        assert_eq!(refs.get_ref("panel").unwrap().element_id(), "new");
    }

    #[test]
    fn test_clear() {
        let refs = RefMap::new();
        refs.create_ref("a").set(Some(fake_element("a-1")));
        refs.create_ref("b").set(Some(fake_element("b-1")));

        refs.clear();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_missing_lookup_is_none() {
        let refs = RefMap::new();
        assert!(refs.get_ref("nope").is_none());
    }
}
