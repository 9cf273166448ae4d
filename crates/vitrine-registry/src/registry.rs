//! Component registry
//!
//! Central catalog, factory dispatch, bulk lifecycle fan-out, and a
//! lightweight message bus. A registry is an explicit context object handed
//! to call sites, never a hidden process singleton, so every test can own an
//! isolated catalog.

use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::definition::ComponentDefinition;
use crate::error::{RegistryError, RegistryResult};
use vitrine_core::component::{validate_type_name, InstanceId, PropMap};
use vitrine_core::config::{DuplicatePolicy, RegistryConfig};
use vitrine_core::host::{DomAdapter, ElementRef, MountTarget, UiEvent};
use vitrine_core::store::GlobalStore;
use vitrine_runtime::ComponentRuntime;

/// One tracked instance
struct InstanceRecord {
    id: InstanceId,
    runtime: ComponentRuntime,
    type_name: String,
    props: PropMap,
    mounted: bool,
    host: Option<ElementRef>,
}

/// Read-only view of one tracked instance
#[derive(Clone)]
pub struct InstanceSnapshot {
    /// The instance's id
    pub id: InstanceId,
    /// Definition name the instance was created from
    pub type_name: String,
    /// Whether a mount completed for this instance
    pub mounted: bool,
}

/// Per-instance entry in [`RegistryInfo`]
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    /// The instance's id
    pub id: String,
    /// Definition name the instance was created from
    pub type_name: String,
    /// Whether a mount completed for this instance
    pub mounted: bool,
    /// Current lifecycle state
    pub status: String,
}

/// Read-only snapshot of the whole registry
#[derive(Debug, Clone)]
pub struct RegistryInfo {
    /// Registered definition names, sorted
    pub registered_types: Vec<String>,
    /// Total tracked instances
    pub instance_count: usize,
    /// Instances whose mount completed
    pub mounted_count: usize,
    /// Per-instance details, sorted by id
    pub instances: Vec<InstanceInfo>,
}

/// Catalog of component definitions and live instances
pub struct ComponentRegistry {
    definitions: RwLock<HashMap<String, ComponentDefinition>>,
    instances: RwLock<HashMap<String, InstanceRecord>>,
    next_seq: AtomicU64,
    adapter: Arc<dyn DomAdapter>,
    store: Arc<GlobalStore>,
    config: RegistryConfig,
}

impl ComponentRegistry {
    /// Create a registry with default configuration
    pub fn new(adapter: Arc<dyn DomAdapter>, store: Arc<GlobalStore>) -> Self {
        Self::with_config(adapter, store, RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(
        adapter: Arc<dyn DomAdapter>,
        store: Arc<GlobalStore>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            adapter,
            store,
            config,
        }
    }

    /// The shared global store
    pub fn store(&self) -> Arc<GlobalStore> {
        self.store.clone()
    }

    /// The shared render-target adapter
    pub fn adapter(&self) -> Arc<dyn DomAdapter> {
        self.adapter.clone()
    }

    /// Store a definition under its name
    ///
    /// Duplicate handling follows `RegistryConfig.on_duplicate`: overwrite
    /// (last writer wins) by default, or reject with
    /// [`RegistryError::DuplicateDefinition`]. An eager singleton
    /// (`singleton && !lazy`) is instantiated, unmounted, right here.
    #[instrument(skip(self, definition), fields(name = %definition.name), level = "debug")]
    pub async fn register(&self, definition: ComponentDefinition) -> RegistryResult<()> {
        validate_type_name(&definition.name).map_err(|source| {
            RegistryError::InvalidDefinition {
                name: definition.name.clone(),
                reason: source.to_string(),
            }
        })?;

        let eager = definition.singleton && !definition.lazy;
        let name = definition.name.clone();
        {
            let mut definitions = self.definitions.write().await;
            if definitions.contains_key(&name) {
                match self.config.on_duplicate {
                    DuplicatePolicy::Reject => {
                        return Err(RegistryError::DuplicateDefinition { name });
                    }
                    DuplicatePolicy::Overwrite => {
                        debug!(name = %name, "definition overwritten");
                    }
                }
            }
            definitions.insert(name.clone(), definition);
        }

        if eager {
            self.create(&name, PropMap::new(), None).await?;
        }
        Ok(())
    }

    /// Registered definition names, sorted
    pub async fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build (and optionally mount) an instance of a named type
    ///
    /// A singleton definition with a live instance returns that instance's
    /// id instead of building a second one. When a mount target is supplied,
    /// `mounted` flips true only after the mount resolved; on mount failure
    /// the record is kept unmounted and the id travels in
    /// [`RegistryError::MountFailed`] so the caller can destroy it.
    #[instrument(skip(self, props, target), level = "debug")]
    pub async fn create(
        &self,
        name: &str,
        props: PropMap,
        target: Option<MountTarget>,
    ) -> RegistryResult<InstanceId> {
        let definition = {
            let definitions = self.definitions.read().await;
            definitions
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::unregistered(name))?
        };

        if definition.singleton {
            if let Some(existing) = self.find_live(name).await {
                if let Some(target) = target {
                    self.mount_instance(&existing, &target).await?;
                }
                return Ok(existing);
            }
        }

        {
            let instances = self.instances.read().await;
            if instances.len() >= self.config.max_instances_count {
                return Err(RegistryError::Internal {
                    message: format!(
                        "maximum instance count reached: {}",
                        self.config.max_instances_count
                    ),
                });
            }
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let id = InstanceId::new(name, seq).map_err(|source| RegistryError::InvalidDefinition {
            name: name.to_string(),
            reason: source.to_string(),
        })?;

        let component = definition.factory.create();
        let runtime = ComponentRuntime::new(
            id.clone(),
            component,
            props.clone(),
            self.adapter.clone(),
            self.store.clone(),
        );

        let record = InstanceRecord {
            id: id.clone(),
            runtime,
            type_name: name.to_string(),
            props,
            mounted: false,
            host: None,
        };
        self.instances.write().await.insert(id.to_string(), record);
        info!(id = %id, "instance created");

        if let Some(target) = target {
            self.mount_instance(&id, &target).await?;
        }
        Ok(id)
    }

    /// Mount a tracked, not-yet-mounted instance
    async fn mount_instance(&self, id: &InstanceId, target: &MountTarget) -> RegistryResult<()> {
        let (runtime, already_mounted) = {
            let instances = self.instances.read().await;
            let record = instances
                .get(&id.to_string())
                .ok_or_else(|| RegistryError::instance_not_found(id.to_string()))?;
            (record.runtime.clone(), record.mounted)
        };
        if already_mounted {
            return Ok(());
        }

        if let Err(source) = runtime.mount(target).await {
            // The record stays, unmounted; cleanup belongs to the caller.
            return Err(RegistryError::MountFailed {
                id: id.to_string(),
                source,
            });
        }

        let host = runtime.host().await;
        let mut instances = self.instances.write().await;
        if let Some(record) = instances.get_mut(&id.to_string()) {
            record.mounted = true;
            record.host = host;
        }
        Ok(())
    }

    /// Handle to a tracked instance's runtime
    pub async fn get_instance(&self, id: &InstanceId) -> Option<ComponentRuntime> {
        self.instances
            .read()
            .await
            .get(&id.to_string())
            .map(|record| record.runtime.clone())
    }

    /// Snapshots of every tracked instance, ordered by creation
    pub async fn get_all_instances(&self) -> Vec<InstanceSnapshot> {
        let instances = self.instances.read().await;
        let mut snapshots: Vec<InstanceSnapshot> = instances
            .values()
            .map(|record| InstanceSnapshot {
                id: record.id.clone(),
                type_name: record.type_name.clone(),
                mounted: record.mounted,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id.seq());
        snapshots
    }

    /// Ids of every instance built from the named definition
    ///
    /// Exact match on the record's definition name.
    pub async fn find_by_name(&self, name: &str) -> Vec<InstanceId> {
        let instances = self.instances.read().await;
        let mut ids: Vec<InstanceId> = instances
            .values()
            .filter(|record| record.type_name == name)
            .map(|record| record.id.clone())
            .collect();
        ids.sort_by_key(|id| id.seq());
        ids
    }

    async fn find_live(&self, name: &str) -> Option<InstanceId> {
        self.instances
            .read()
            .await
            .values()
            .find(|record| record.type_name == name)
            .map(|record| record.id.clone())
    }

    /// Update a tracked instance's props
    ///
    /// Refreshes the stored props snapshot, then forwards to the runtime.
    ///
    /// # Errors
    /// [`RegistryError::InstanceNotFound`] for an unknown id; hook errors
    /// surface wrapped in [`RegistryError::Component`].
    pub async fn update_props(&self, id: &InstanceId, partial: PropMap) -> RegistryResult<()> {
        let runtime = {
            let mut instances = self.instances.write().await;
            let record = instances
                .get_mut(&id.to_string())
                .ok_or_else(|| RegistryError::instance_not_found(id.to_string()))?;
            for (key, value) in &partial {
                record.props.insert(key.clone(), value.clone());
            }
            record.runtime.clone()
        };

        runtime
            .update_props(partial)
            .await
            .map_err(|source| RegistryError::Component {
                id: id.to_string(),
                source,
            })
    }

    /// Destroy a tracked instance and drop its record
    ///
    /// An unknown id is a silent no-op, unlike `update_props`.
    pub async fn destroy(&self, id: &InstanceId) -> RegistryResult<()> {
        let runtime = {
            let instances = self.instances.read().await;
            match instances.get(&id.to_string()) {
                Some(record) => record.runtime.clone(),
                None => return Ok(()),
            }
        };

        runtime
            .destroy()
            .await
            .map_err(|source| RegistryError::Component {
                id: id.to_string(),
                source,
            })?;

        self.instances.write().await.remove(&id.to_string());
        debug!(id = %id, "instance removed");
        Ok(())
    }

    /// Destroy every instance of the named definition, concurrently
    ///
    /// Returns the number of records removed. Individual hook failures are
    /// logged and do not stop the sweep.
    pub async fn destroy_by_name(&self, name: &str) -> usize {
        let ids = self.find_by_name(name).await;
        self.destroy_batch(ids).await
    }

    /// Destroy every tracked instance, concurrently
    pub async fn destroy_all(&self) -> usize {
        let ids: Vec<InstanceId> = {
            self.instances
                .read()
                .await
                .values()
                .map(|record| record.id.clone())
                .collect()
        };
        self.destroy_batch(ids).await
    }

    async fn destroy_batch(&self, ids: Vec<InstanceId>) -> usize {
        let targets: Vec<(InstanceId, ComponentRuntime)> = {
            let instances = self.instances.read().await;
            ids.iter()
                .filter_map(|id| {
                    instances
                        .get(&id.to_string())
                        .map(|record| (id.clone(), record.runtime.clone()))
                })
                .collect()
        };

        let results = join_all(targets.into_iter().map(|(id, runtime)| async move {
            let result = runtime.destroy().await;
            (id, result)
        }))
        .await;

        let mut instances = self.instances.write().await;
        let mut removed = 0;
        for (id, result) in results {
            if let Err(err) = result {
                error!(id = %id, error = %err, "destroy failed during bulk teardown");
            }
            instances.remove(&id.to_string());
            removed += 1;
        }
        info!(removed, "bulk teardown complete");
        removed
    }

    /// Fire an event at every tracked instance
    ///
    /// Dispatches to each instance's host element, falling back to document
    /// scope for host-less instances. Fire-and-forget: synchronous dispatch
    /// to currently-attached listeners, no delivery guarantee.
    pub async fn broadcast(&self, event_name: &str, data: Value) {
        let event = UiEvent::new(event_name, data);
        let hosts: Vec<Option<ElementRef>> = {
            self.instances
                .read()
                .await
                .values()
                .map(|record| record.host.clone())
                .collect()
        };
        for host in hosts {
            match host {
                Some(host) => {
                    host.dispatch(&event);
                }
                None => {
                    self.adapter.dispatch_document(&event).await;
                }
            }
        }
    }

    /// Fire an event at a single instance by id
    ///
    /// Unknown ids are ignored (fire-and-forget).
    pub async fn send(&self, id: &InstanceId, event_name: &str, data: Value) {
        let event = UiEvent::new(event_name, data);
        let host = {
            match self.instances.read().await.get(&id.to_string()) {
                Some(record) => record.host.clone(),
                None => return,
            }
        };
        match host {
            Some(host) => {
                host.dispatch(&event);
            }
            None => {
                self.adapter.dispatch_document(&event).await;
            }
        }
    }

    /// Read-only snapshot of definitions and instances
    pub async fn registry_info(&self) -> RegistryInfo {
        let registered_types = self.registered_names().await;

        let records: Vec<(InstanceId, String, bool, ComponentRuntime)> = {
            self.instances
                .read()
                .await
                .values()
                .map(|record| {
                    (
                        record.id.clone(),
                        record.type_name.clone(),
                        record.mounted,
                        record.runtime.clone(),
                    )
                })
                .collect()
        };

        let mut mounted_count = 0;
        let mut instances = Vec::with_capacity(records.len());
        for (id, type_name, mounted, runtime) in records {
            if mounted {
                mounted_count += 1;
            }
            let status = runtime.lifecycle().await.to_string();
            instances.push(InstanceInfo {
                id: id.to_string(),
                type_name,
                mounted,
                status,
            });
        }
        instances.sort_by(|a, b| a.id.cmp(&b.id));

        RegistryInfo {
            registered_types,
            instance_count: instances.len(),
            mounted_count,
            instances,
        }
    }
}
