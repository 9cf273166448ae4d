//! Component runtime
//!
//! Drives one instance through mount, update, and teardown. All operations
//! serialize on the instance's lock, so two overlapping `set_state` calls on
//! the same instance drain one after the other instead of racing; within a
//! single call the order is always watchers, `before_update`, render,
//! `updated`.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::lifecycle::{LifecycleState, RuntimeStats};
use vitrine_core::component::{Component, ComponentContext, InstanceId, PropMap, StateMap};
use vitrine_core::config::RuntimeConfig;
use vitrine_core::error::{Error, Result};
use vitrine_core::host::{BoundaryRef, DomAdapter, ElementRef, MountTarget};
use vitrine_core::refs::{RefMap, RefSetter};
use vitrine_core::store::{GlobalStore, StoreChange, StoreSubscription};
use vitrine_core::watch::{WatcherCallback, WatcherHandle, WatcherSet};

/// Which map an update call is aimed at
#[derive(Debug, Clone, Copy)]
enum UpdateKind {
    Props,
    State,
}

impl UpdateKind {
    fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Props => "update_props",
            UpdateKind::State => "set_state",
        }
    }
}

struct Inner {
    component: Arc<dyn Component>,
    ctx: ComponentContext,
    lifecycle: LifecycleState,
    boundary: Option<BoundaryRef>,
    adapter: Arc<dyn DomAdapter>,
    store: Arc<GlobalStore>,
    store_sub: Option<StoreSubscription>,
    stats: RuntimeStats,
    config: RuntimeConfig,
}

/// Handle to one live component instance
///
/// Cheap to clone; clones address the same instance. Hook errors are never
/// caught here - they propagate to whoever called the triggering operation,
/// and an instance whose hook failed mid-operation stays in that
/// mid-lifecycle state until `destroy`.
#[derive(Clone)]
pub struct ComponentRuntime {
    id: InstanceId,
    type_name: String,
    prop_watchers: WatcherSet,
    state_watchers: WatcherSet,
    refs: RefMap,
    inner: Arc<Mutex<Inner>>,
}

impl ComponentRuntime {
    /// Create an unmounted instance
    pub fn new(
        id: InstanceId,
        component: Arc<dyn Component>,
        props: PropMap,
        adapter: Arc<dyn DomAdapter>,
        store: Arc<GlobalStore>,
    ) -> Self {
        Self::with_config(id, component, props, adapter, store, RuntimeConfig::default())
    }

    /// Create an unmounted instance with custom limits
    pub fn with_config(
        id: InstanceId,
        component: Arc<dyn Component>,
        props: PropMap,
        adapter: Arc<dyn DomAdapter>,
        store: Arc<GlobalStore>,
        config: RuntimeConfig,
    ) -> Self {
        let ctx = ComponentContext::new(id.clone(), props);
        let prop_watchers = ctx.prop_watcher_set();
        let state_watchers = ctx.state_watcher_set();
        let refs = ctx.refs();
        let type_name = component.type_name().to_string();

        Self {
            id,
            type_name,
            prop_watchers,
            state_watchers,
            refs,
            inner: Arc::new(Mutex::new(Inner {
                component,
                ctx,
                lifecycle: LifecycleState::default(),
                boundary: None,
                adapter,
                store,
                store_sub: None,
                stats: RuntimeStats::default(),
                config,
            })),
        }
    }

    /// The instance's unique identifier
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// The component's type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current lifecycle state
    pub async fn lifecycle(&self) -> LifecycleState {
        self.inner.lock().await.lifecycle
    }

    /// Counters for this instance
    pub async fn stats(&self) -> RuntimeStats {
        self.inner.lock().await.stats
    }

    /// The host element, if mounted
    pub async fn host(&self) -> Option<ElementRef> {
        self.inner.lock().await.ctx.host()
    }

    /// Snapshot of current props
    pub async fn props(&self) -> PropMap {
        self.inner.lock().await.ctx.props.clone()
    }

    /// Snapshot of current state
    pub async fn state(&self) -> StateMap {
        self.inner.lock().await.ctx.state.clone()
    }

    /// Watch a prop key; the handle's `cancel` is idempotent
    pub fn watch_prop(&self, key: impl Into<String>, callback: WatcherCallback) -> WatcherHandle {
        self.prop_watchers.watch(key, callback)
    }

    /// Watch a state key; the handle's `cancel` is idempotent
    pub fn watch_state(&self, key: impl Into<String>, callback: WatcherCallback) -> WatcherHandle {
        self.state_watchers.watch(key, callback)
    }

    /// Build a setter for a named ref
    pub fn create_ref(&self, name: impl Into<String>) -> RefSetter {
        self.refs.create_ref(name)
    }

    /// Look up a named ref from the most recent render
    pub fn get_ref(&self, name: &str) -> Option<ElementRef> {
        self.refs.get_ref(name)
    }

    /// Total watcher subscriptions across props and state
    pub fn watcher_count(&self) -> usize {
        self.prop_watchers.len() + self.state_watchers.len()
    }

    /// Number of stored refs
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// Mount against a render target
    ///
    /// Runs `before_mount`, performs the first render, runs `mounted`, then
    /// subscribes to the global store when the component observes it. The
    /// host's previous content is replaced.
    ///
    /// # Errors
    /// `HostNotFound` when the target resolves to no element;
    /// `LifecycleViolation` unless the instance is still unmounted; hook
    /// errors propagate unmodified.
    #[instrument(skip(self, target), fields(id = %self.id, target = %target), level = "info")]
    pub async fn mount(&self, target: &MountTarget) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle != LifecycleState::Unmounted {
            return Err(Error::LifecycleViolation {
                id: self.id.to_string(),
                state: inner.lifecycle.to_string(),
                operation: "mount".into(),
            });
        }
        debug_assert!(inner.lifecycle.can_transition_to(LifecycleState::Mounting));
        inner.lifecycle = LifecycleState::Mounting;

        let adapter = inner.adapter.clone();
        let host = adapter
            .resolve(target)
            .await
            .ok_or_else(|| Error::HostNotFound {
                target: target.to_string(),
            })?;
        inner.ctx.set_host(Some(host));

        let component = inner.component.clone();
        if let Err(error) = component.before_mount(&mut inner.ctx).await {
            inner.stats.record_hook_error();
            return Err(error);
        }
        Self::render_pass(&mut inner, &component).await?;
        if let Err(error) = component.mounted(&mut inner.ctx).await {
            inner.stats.record_hook_error();
            return Err(error);
        }

        if component.observes_store() {
            let subscription = Self::subscribe_store(&self.inner, &inner);
            inner.store_sub = Some(subscription);
        }

        inner.lifecycle = LifecycleState::Mounted;
        info!(id = %self.id, "component mounted");
        Ok(())
    }

    /// Shallow-merge new props and re-render
    ///
    /// Unknown keys are simply stored. Watchers for every changed key fire
    /// before `before_update`; an empty partial still triggers a render.
    pub async fn update_props(&self, partial: PropMap) -> Result<()> {
        self.apply(partial, UpdateKind::Props).await
    }

    /// Shallow-merge new state and re-render
    ///
    /// Same contract as [`update_props`](Self::update_props) against the
    /// state map and state watchers. A state read made after calling but
    /// before awaiting this observes the pre-update value.
    pub async fn set_state(&self, partial: StateMap) -> Result<()> {
        self.apply(partial, UpdateKind::State).await
    }

    async fn apply(&self, partial: Map<String, Value>, kind: UpdateKind) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.lifecycle.can_update() {
            return Err(Error::LifecycleViolation {
                id: self.id.to_string(),
                state: inner.lifecycle.to_string(),
                operation: kind.as_str().into(),
            });
        }

        let was_mounted = inner.lifecycle == LifecycleState::Mounted;
        if was_mounted {
            inner.lifecycle = LifecycleState::Updating;
        }
        let result = Self::apply_update(&mut inner, partial, kind).await;
        if result.is_ok() && was_mounted {
            inner.lifecycle = LifecycleState::Mounted;
        }
        result
    }

    async fn apply_update(
        inner: &mut Inner,
        partial: Map<String, Value>,
        kind: UpdateKind,
    ) -> Result<()> {
        let prev_props = inner.ctx.props.clone();
        let prev_state = inner.ctx.state.clone();

        let changed_count = {
            let ctx = &mut inner.ctx;
            let watchers = match kind {
                UpdateKind::Props => ctx.prop_watcher_set(),
                UpdateKind::State => ctx.state_watcher_set(),
            };
            let target = match kind {
                UpdateKind::Props => &mut ctx.props,
                UpdateKind::State => &mut ctx.state,
            };

            let mut changed: Vec<(String, Value, Value)> = Vec::new();
            for (key, value) in partial {
                let old = target.get(&key).cloned().unwrap_or(Value::Null);
                if old != value {
                    changed.push((key.clone(), value.clone(), old));
                }
                target.insert(key, value);
            }

            // Every watcher for this batch fires before any hook runs.
            for (key, new, old) in &changed {
                watchers.notify(key, new, old);
            }
            changed.len()
        };

        let component = inner.component.clone();
        if let Err(error) = component.before_update(&mut inner.ctx, &prev_props).await {
            inner.stats.record_hook_error();
            return Err(error);
        }
        Self::render_pass(inner, &component).await?;
        if let Err(error) = component
            .updated(&mut inner.ctx, &prev_props, &prev_state)
            .await
        {
            inner.stats.record_hook_error();
            return Err(error);
        }

        inner.stats.record_update();
        debug!(changed_count, operation = kind.as_str(), "update applied");
        Ok(())
    }

    /// Tear the instance down
    ///
    /// Runs `before_unmount`, clears watchers and refs, drops the store
    /// subscription, detaches the host, runs `unmounted`. Calling again on a
    /// destroyed instance is a safe no-op.
    #[instrument(skip(self), fields(id = %self.id), level = "info")]
    pub async fn destroy(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle == LifecycleState::Destroyed {
            return Ok(());
        }
        debug_assert!(inner.lifecycle.can_transition_to(LifecycleState::Unmounting));
        inner.lifecycle = LifecycleState::Unmounting;

        let component = inner.component.clone();
        if let Err(error) = component.before_unmount(&mut inner.ctx).await {
            inner.stats.record_hook_error();
            return Err(error);
        }

        self.prop_watchers.clear();
        self.state_watchers.clear();
        self.refs.clear();

        if let Some(subscription) = inner.store_sub.take() {
            subscription.cancel();
        }

        if let Some(host) = inner.ctx.host() {
            host.clear_listeners();
            if host.is_attached() {
                host.detach();
            }
        }
        inner.ctx.set_host(None);
        inner.boundary = None;

        if let Err(error) = component.unmounted(&mut inner.ctx).await {
            inner.stats.record_hook_error();
            return Err(error);
        }

        inner.lifecycle = LifecycleState::Destroyed;
        info!(
            id = %self.id,
            renders = inner.stats.renders,
            updates = inner.stats.updates,
            "component destroyed"
        );
        Ok(())
    }

    /// The render pass shared by mount and both update paths
    ///
    /// No-op without a host or a template. Non-empty style text creates the
    /// host's isolation boundary on first use; with a boundary and styles
    /// present the markup is written wrapped in a `<style>` block, otherwise
    /// raw. Afterwards the component re-caches refs and re-binds listeners
    /// against the fresh markup.
    async fn render_pass(inner: &mut Inner, component: &Arc<dyn Component>) -> Result<()> {
        let Some(host) = inner.ctx.host() else {
            return Ok(());
        };
        let Some(markup) = component.render(&inner.ctx) else {
            return Ok(());
        };
        if markup.len() > inner.config.markup_size_bytes_max {
            return Err(Error::MarkupTooLarge {
                size: markup.len(),
                limit: inner.config.markup_size_bytes_max,
            });
        }

        let style = component.css(&inner.ctx).filter(|s| !s.is_empty());
        let adapter = inner.adapter.clone();

        if style.is_some() && inner.boundary.is_none() {
            inner.boundary = Some(adapter.ensure_boundary(&host).await?);
        }

        match (&inner.boundary, style) {
            (Some(boundary), Some(style)) => {
                let wrapped = format!("<style>{}</style>{}", style, markup);
                adapter.write_boundary(boundary, &wrapped).await?;
            }
            (Some(boundary), None) => {
                adapter.write_boundary(boundary, &markup).await?;
            }
            (None, _) => {
                adapter.write_host(&host, &markup).await?;
            }
        }

        component.cache_elements(&mut inner.ctx);
        component.bind_events(&mut inner.ctx);
        inner.ctx.record_render();
        inner.stats.record_render();
        Ok(())
    }

    /// Wire the global store to the `store_changed` hook
    ///
    /// The subscription holds only a weak handle; deliveries are spawned so
    /// a store mutation made from inside a hook cannot deadlock against the
    /// instance lock.
    fn subscribe_store(shared: &Arc<Mutex<Inner>>, inner: &Inner) -> StoreSubscription {
        let weak = Arc::downgrade(shared);
        inner.store.subscribe(Arc::new(move |change: &StoreChange| {
            let Some(strong) = weak.upgrade() else {
                return;
            };
            let change = change.clone();
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                warn!("store change dropped: no async runtime active");
                return;
            };
            handle.spawn(async move {
                let mut inner = strong.lock().await;
                let component = inner.component.clone();
                if let Err(error) = component.store_changed(&mut inner.ctx, change).await {
                    inner.stats.record_hook_error();
                    warn!(%error, "store change hook failed");
                }
            });
        }))
    }
}
