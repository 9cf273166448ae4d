//! Component abstractions
//!
//! A component is a value implementing an optional-hooks capability set plus
//! a template capability, not a subclass in an inheritance chain. The runtime
//! drives the hooks; the registry names instances.

use crate::constants::{INSTANCE_ID_LENGTH_BYTES_MAX, TYPE_NAME_LENGTH_BYTES_MAX};
use crate::error::{Error, Result};
use crate::host::ElementRef;
use crate::refs::{RefMap, RefSetter};
use crate::store::StoreChange;
use crate::watch::{WatcherCallback, WatcherHandle, WatcherSet};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Externally-supplied configuration map, replaced by shallow merge
pub type PropMap = Map<String, Value>;

/// Internal runtime-owned data map, mutated only through `set_state`
pub type StateMap = Map<String, Value>;

// =============================================================================
// InstanceId
// =============================================================================

/// Unique identifier for a component instance
///
/// Registry-generated: the definition's type name plus a monotonic counter,
/// unique for the registry's lifetime. Immutable after creation.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct InstanceId {
    type_name: String,
    seq: u64,
}

impl InstanceId {
    /// Create a new InstanceId with validation
    ///
    /// # Errors
    /// Returns an error if the type name is empty, exceeds the length limit,
    /// or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(type_name: impl Into<String>, seq: u64) -> Result<Self> {
        let type_name = type_name.into();
        validate_type_name(&type_name)?;
        Ok(Self { type_name, seq })
    }

    /// The definition name this instance was built from
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The monotonic counter portion
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.type_name, self.seq)
    }
}

/// Validate a component type name
pub fn validate_type_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidTypeName {
            name: name.to_string(),
            reason: "must not be empty".into(),
        });
    }
    if name.len() > TYPE_NAME_LENGTH_BYTES_MAX {
        return Err(Error::TypeNameTooLong {
            length: name.len(),
            limit: TYPE_NAME_LENGTH_BYTES_MAX,
        });
    }
    let valid = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(Error::InvalidTypeName {
            name: name.to_string(),
            reason: "contains invalid characters".into(),
        });
    }
    debug_assert!(name.len() + 21 <= INSTANCE_ID_LENGTH_BYTES_MAX);
    Ok(())
}

// =============================================================================
// Component Trait
// =============================================================================

/// Component trait - implement to create a stateful widget
///
/// All hooks have default no-op bodies; a widget implements only the subset
/// it needs. Hook errors are never caught by the runtime - they propagate
/// unmodified to whoever called the triggering operation.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// The component's type name, matching its registry definition
    fn type_name(&self) -> &str;

    /// Produce the markup for the current props and state
    ///
    /// Returning `None` means no template is configured and the render pass
    /// is a no-op.
    fn render(&self, ctx: &ComponentContext) -> Option<String>;

    /// Produce style text for the isolation boundary
    ///
    /// Non-empty style text causes an isolation boundary to be created on
    /// first render against a host.
    fn css(&self, _ctx: &ComponentContext) -> Option<String> {
        None
    }

    /// Whether this component wants global store change notifications
    fn observes_store(&self) -> bool {
        false
    }

    /// Called before the first render while mounting
    async fn before_mount(&self, _ctx: &mut ComponentContext) -> Result<()> {
        Ok(())
    }

    /// Called after the first render completed
    async fn mounted(&self, _ctx: &mut ComponentContext) -> Result<()> {
        Ok(())
    }

    /// Called after watchers fired, before the update's render pass
    async fn before_update(
        &self,
        _ctx: &mut ComponentContext,
        _prev_props: &PropMap,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after the update's render pass completed
    async fn updated(
        &self,
        _ctx: &mut ComponentContext,
        _prev_props: &PropMap,
        _prev_state: &StateMap,
    ) -> Result<()> {
        Ok(())
    }

    /// Called at the start of teardown, before any cleanup
    async fn before_unmount(&self, _ctx: &mut ComponentContext) -> Result<()> {
        Ok(())
    }

    /// Called at the end of teardown, after the host was detached
    async fn unmounted(&self, _ctx: &mut ComponentContext) -> Result<()> {
        Ok(())
    }

    /// Called on global store mutations when `observes_store` is true
    async fn store_changed(
        &self,
        _ctx: &mut ComponentContext,
        _change: StoreChange,
    ) -> Result<()> {
        Ok(())
    }

    /// Re-cache element refs after a render replaced the markup
    fn cache_elements(&self, _ctx: &mut ComponentContext) {}

    /// Re-attach event listeners after a render replaced the markup
    fn bind_events(&self, _ctx: &mut ComponentContext) {}
}

// =============================================================================
// ComponentContext
// =============================================================================

/// Context handed to a component's hooks
///
/// Owns the instance's props and state; exposes refs and watcher
/// registration. The runtime holds the context for the instance's lifetime.
pub struct ComponentContext {
    /// The instance's unique identifier
    pub id: InstanceId,
    /// Externally-supplied configuration
    pub props: PropMap,
    /// Internal component data
    pub state: StateMap,
    /// Render target, present once mounted
    pub(crate) host: Option<ElementRef>,
    pub(crate) refs: RefMap,
    pub(crate) prop_watchers: WatcherSet,
    pub(crate) state_watchers: WatcherSet,
    /// Renders performed so far
    pub(crate) renders: u64,
}

impl ComponentContext {
    /// Create a context with the given initial props and empty state
    pub fn new(id: InstanceId, props: PropMap) -> Self {
        Self {
            id,
            props,
            state: StateMap::new(),
            host: None,
            refs: RefMap::new(),
            prop_watchers: WatcherSet::new(),
            state_watchers: WatcherSet::new(),
            renders: 0,
        }
    }

    /// The host element, if mounted
    pub fn host(&self) -> Option<ElementRef> {
        self.host.clone()
    }

    /// Build a setter for a named ref
    pub fn create_ref(&self, name: impl Into<String>) -> RefSetter {
        self.refs.create_ref(name)
    }

    /// Look up a named ref from the most recent render
    pub fn get_ref(&self, name: &str) -> Option<ElementRef> {
        self.refs.get_ref(name)
    }

    /// Watch a prop key for changes
    pub fn watch_prop(&self, key: impl Into<String>, callback: WatcherCallback) -> WatcherHandle {
        self.prop_watchers.watch(key, callback)
    }

    /// Watch a state key for changes
    pub fn watch_state(&self, key: impl Into<String>, callback: WatcherCallback) -> WatcherHandle {
        self.state_watchers.watch(key, callback)
    }

    /// Renders performed for this instance so far
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Shared handle to this context's ref map
    pub fn refs(&self) -> RefMap {
        self.refs.clone()
    }

    /// Shared handle to this context's prop watcher set
    pub fn prop_watcher_set(&self) -> WatcherSet {
        self.prop_watchers.clone()
    }

    /// Shared handle to this context's state watcher set
    pub fn state_watcher_set(&self) -> WatcherSet {
        self.state_watchers.clone()
    }

    /// Attach or clear the host element (runtime use only)
    #[doc(hidden)]
    pub fn set_host(&mut self, host: Option<ElementRef>) {
        self.host = host;
    }

    /// Bump the render counter (runtime use only)
    #[doc(hidden)]
    pub fn record_render(&mut self) {
        self.renders = self.renders.wrapping_add(1);
    }
}
