//! Render-target contracts
//!
//! The runtime never touches a concrete document model. Everything it needs
//! from the rendering host goes through these traits; `vitrine-dom` ships an
//! in-memory implementation and a browser bridge can supply another.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::constants::EVENT_NAME_LENGTH_BYTES_MAX;

// =============================================================================
// Events
// =============================================================================

/// A notification event dispatched through the message bus
#[derive(Debug, Clone)]
pub struct UiEvent {
    /// Event name, as listeners subscribe to it
    pub name: String,
    /// Arbitrary event payload
    pub data: Value,
}

impl UiEvent {
    /// Create a new event
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "event name must not be empty");
        debug_assert!(name.len() <= EVENT_NAME_LENGTH_BYTES_MAX);
        Self { name, data }
    }
}

/// Listener callback invoked on synchronous event dispatch
pub type UiListener = Arc<dyn Fn(&UiEvent) + Send + Sync>;

// =============================================================================
// Host Elements
// =============================================================================

/// A handle to one element in the rendering host
///
/// Exactly one runtime instance owns a host element at a time; the runtime
/// replaces its content wholesale on every render.
pub trait HostElement: Send + Sync {
    /// The element's id within its document
    fn element_id(&self) -> &str;

    /// Current content of the element
    fn inner_html(&self) -> String;

    /// Whether the element is still attached to its document
    fn is_attached(&self) -> bool;

    /// Detach the element from its document
    fn detach(&self);

    /// Replace the element's content
    ///
    /// Listeners attached to the replaced content are discarded.
    fn replace_content(&self, markup: &str);

    /// Attach a listener for the named event
    fn add_listener(&self, event: &str, listener: UiListener);

    /// Drop every listener on this element
    fn clear_listeners(&self);

    /// Synchronously dispatch an event to currently-attached listeners
    ///
    /// Returns the number of listeners invoked. Fire-and-forget: there is no
    /// delivery guarantee beyond this synchronous pass.
    fn dispatch(&self, event: &UiEvent) -> usize;
}

/// Shared handle to a host element
pub type ElementRef = Arc<dyn HostElement>;

// =============================================================================
// Isolation Boundaries
// =============================================================================

/// A style-scoping attachment point on a host element
///
/// Keeps a component's markup and styles from leaking to or from the
/// surrounding document. Created at most once per host.
pub trait StyleBoundary: Send + Sync {
    /// Id of the host element this boundary is attached to
    fn host_id(&self) -> &str;

    /// Current content of the boundary
    fn content(&self) -> String;

    /// Replace the boundary's content
    fn replace_content(&self, markup: &str);
}

/// Shared handle to an isolation boundary
pub type BoundaryRef = Arc<dyn StyleBoundary>;

// =============================================================================
// Mount Targets
// =============================================================================

/// Where a component instance should be mounted
#[derive(Clone)]
pub enum MountTarget {
    /// A lookup string that must resolve to exactly one element
    Selector(String),
    /// A direct element reference
    Element(ElementRef),
}

impl MountTarget {
    /// Convenience constructor for selector targets
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector(selector.into())
    }
}

impl From<ElementRef> for MountTarget {
    fn from(element: ElementRef) -> Self {
        Self::Element(element)
    }
}

impl fmt::Display for MountTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountTarget::Selector(selector) => write!(f, "{}", selector),
            MountTarget::Element(element) => write!(f, "<element #{}>", element.element_id()),
        }
    }
}

impl fmt::Debug for MountTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MountTarget({})", self)
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// The render-target adapter consumed by the runtime
///
/// Implementations own the per-host boundary bookkeeping: whether a host
/// already carries an isolation boundary is an explicit registry entry on the
/// adapter, never inferred by inspecting the host at render time.
#[async_trait]
pub trait DomAdapter: Send + Sync {
    /// Resolve a mount target to a host element
    ///
    /// Returns `None` when resolution yields no element.
    async fn resolve(&self, target: &MountTarget) -> Option<ElementRef>;

    /// Get the host's isolation boundary, creating it on first use
    ///
    /// Calling twice for the same host returns the same boundary.
    async fn ensure_boundary(&self, host: &ElementRef) -> Result<BoundaryRef>;

    /// Look up an existing boundary for a host without creating one
    async fn boundary_of(&self, host: &ElementRef) -> Option<BoundaryRef>;

    /// Write markup directly into a host element
    async fn write_host(&self, host: &ElementRef, markup: &str) -> Result<()>;

    /// Write markup into an isolation boundary
    async fn write_boundary(&self, boundary: &BoundaryRef, markup: &str) -> Result<()>;

    /// Attach a document-scope listener
    fn listen_document(&self, event: &str, listener: UiListener);

    /// Dispatch an event at document scope, returning listeners invoked
    async fn dispatch_document(&self, event: &UiEvent) -> usize;
}
