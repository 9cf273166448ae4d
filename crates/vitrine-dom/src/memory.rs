//! In-memory render target
//!
//! For tests and headless embedding. Keeps an explicit per-host boundary
//! registry so "does this host already have an isolation boundary" is a map
//! lookup, never an inspection of the host itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

use crate::element::MemoryElement;
use vitrine_core::error::Result;
use vitrine_core::host::{
    BoundaryRef, DomAdapter, ElementRef, HostElement, MountTarget, StyleBoundary, UiEvent,
    UiListener,
};

/// Isolation boundary attached to one host element
pub struct MemoryBoundary {
    host_id: String,
    host: ElementRef,
    content: Mutex<String>,
}

impl MemoryBoundary {
    fn new(host: ElementRef) -> Self {
        Self {
            host_id: host.element_id().to_string(),
            host,
            content: Mutex::new(String::new()),
        }
    }
}

impl StyleBoundary for MemoryBoundary {
    fn host_id(&self) -> &str {
        &self.host_id
    }

    fn content(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    fn replace_content(&self, markup: &str) {
        *self.content.lock().unwrap() = markup.to_string();
        // Replacement semantics apply to the host's listeners as well.
        self.host.clear_listeners();
    }
}

/// In-memory document
///
/// Elements are registered by id; selector resolution accepts `#id` or a
/// bare id and only finds attached elements.
#[derive(Default)]
pub struct MemoryDom {
    elements: Mutex<HashMap<String, Arc<MemoryElement>>>,
    boundaries: Mutex<HashMap<String, Arc<MemoryBoundary>>>,
    document_listeners: Mutex<HashMap<String, Vec<UiListener>>>,
}

impl MemoryDom {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register an attached element
    pub fn create_element(&self, id: impl Into<String>) -> ElementRef {
        self.insert_element(id, true)
    }

    /// Create and register a detached element
    ///
    /// Detached elements are valid mount targets when passed directly but do
    /// not resolve through selectors.
    pub fn create_detached(&self, id: impl Into<String>) -> ElementRef {
        self.insert_element(id, false)
    }

    fn insert_element(&self, id: impl Into<String>, attached: bool) -> ElementRef {
        let id = id.into();
        let element = MemoryElement::new(id.clone(), attached);
        self.elements.lock().unwrap().insert(id, element.clone());
        element
    }

    /// Look up a registered element by id
    pub fn element(&self, id: &str) -> Option<ElementRef> {
        self.elements
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .map(|e| e as ElementRef)
    }

    /// Number of boundary entries currently tracked
    pub fn boundary_count(&self) -> usize {
        self.boundaries.lock().unwrap().len()
    }

    /// Number of document-scope listeners
    pub fn document_listener_count(&self) -> usize {
        self.document_listeners
            .lock()
            .unwrap()
            .values()
            .map(|v| v.len())
            .sum()
    }
}

#[async_trait]
impl DomAdapter for MemoryDom {
    #[instrument(skip(self), fields(target = %target))]
    async fn resolve(&self, target: &MountTarget) -> Option<ElementRef> {
        match target {
            MountTarget::Selector(selector) => {
                let key = selector.trim_start_matches('#');
                self.elements
                    .lock()
                    .unwrap()
                    .get(key)
                    .filter(|element| element.is_attached())
                    .cloned()
                    .map(|e| e as ElementRef)
            }
            MountTarget::Element(element) => Some(element.clone()),
        }
    }

    async fn ensure_boundary(&self, host: &ElementRef) -> Result<BoundaryRef> {
        let mut boundaries = self.boundaries.lock().unwrap();
        let boundary = boundaries
            .entry(host.element_id().to_string())
            .or_insert_with(|| {
                debug!(host_id = host.element_id(), "isolation boundary created");
                Arc::new(MemoryBoundary::new(host.clone()))
            })
            .clone();
        Ok(boundary as BoundaryRef)
    }

    async fn boundary_of(&self, host: &ElementRef) -> Option<BoundaryRef> {
        self.boundaries
            .lock()
            .unwrap()
            .get(host.element_id())
            .cloned()
            .map(|b| b as BoundaryRef)
    }

    async fn write_host(&self, host: &ElementRef, markup: &str) -> Result<()> {
        host.replace_content(markup);
        Ok(())
    }

    async fn write_boundary(&self, boundary: &BoundaryRef, markup: &str) -> Result<()> {
        boundary.replace_content(markup);
        Ok(())
    }

    fn listen_document(&self, event: &str, listener: UiListener) {
        self.document_listeners
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    async fn dispatch_document(&self, event: &UiEvent) -> usize {
        let listeners: Vec<UiListener> = {
            let map = self.document_listeners.lock().unwrap();
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

    #[tokio::test]
    async fn test_resolve_selector() {
        let dom = MemoryDom::new();
        dom.create_element("sidebar");

        let found = dom.resolve(&MountTarget::selector("#sidebar")).await;
        assert!(found.is_some());
        assert_eq!(found.unwrap().element_id(), "sidebar");

        let missing = dom.resolve(&MountTarget::selector("#nope")).await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_detached_not_found_by_selector_but_resolvable_directly() {
        let dom = MemoryDom::new();
        let element = dom.create_detached("floating");

        let by_selector = dom.resolve(&MountTarget::selector("#floating")).await;
        assert!(by_selector.is_none());

        let direct = dom.resolve(&MountTarget::Element(element)).await;
        assert!(direct.is_some());
    }

    #[tokio::test]
    async fn test_ensure_boundary_is_idempotent() {
        let dom = MemoryDom::new();
        let host = dom.create_element("card");

        let first = dom.ensure_boundary(&host).await.unwrap();
        let second = dom.ensure_boundary(&host).await.unwrap();

        assert_eq!(dom.boundary_count(), 1);
        first.replace_content("shared");
        assert_eq!(second.content(), "shared");
    }

    #[tokio::test]
    async fn test_boundary_of_without_ensure() {
        let dom = MemoryDom::new();
        let host = dom.create_element("card");
        assert!(dom.boundary_of(&host).await.is_none());
    }

    #[tokio::test]
    async fn test_write_host() {
        let dom = MemoryDom::new();
        let host = dom.create_element("card");

        dom.write_host(&host, "<p>hello</p>").await.unwrap();
        assert_eq!(host.inner_html(), "<p>hello</p>");
    }

    #[tokio::test]
    async fn test_boundary_write_clears_host_listeners() {
        let dom = MemoryDom::new();
        let host = dom.create_element("card");
        host.add_listener("click", Arc::new(|_| {}));

        let boundary = dom.ensure_boundary(&host).await.unwrap();
        dom.write_boundary(&boundary, "<style>p{}</style><p>x</p>")
            .await
            .unwrap();

        assert_eq!(host.dispatch(&UiEvent::new("click", json!(null))), 0);
        assert!(boundary.content().contains("<p>x</p>"));
    }

    #[tokio::test]
    async fn test_document_dispatch() {
        let dom = MemoryDom::new();
        let hits = Arc::new(Mutex::new(0usize));

        let hits_clone = hits.clone();
        dom.listen_document(
            "portal:refresh",
            Arc::new(move |_| {
                *hits_clone.lock().unwrap() += 1;
            }),
        );

        let delivered = dom
            .dispatch_document(&UiEvent::new("portal:refresh", json!({"page": 1})))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
