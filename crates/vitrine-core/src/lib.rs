//! Vitrine Core
//!
//! Core types, contracts, and errors for the Vitrine component toolkit.
//!
//! # Overview
//!
//! Vitrine is the component runtime behind a design-review portal: every
//! stateful widget is a [`Component`] driven through a mount/update/unmount
//! lifecycle by `vitrine-runtime`, and tracked by the catalog in
//! `vitrine-registry`. This crate holds what both sides share:
//!
//! - The [`Component`] trait and [`ComponentContext`]
//! - Watchers, refs, and the global store collaborator
//! - Render-target contracts ([`DomAdapter`], [`HostElement`])
//! - Errors, limits, configuration, telemetry

pub mod component;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod refs;
pub mod store;
pub mod telemetry;
pub mod watch;

pub use component::{
    validate_type_name, Component, ComponentContext, InstanceId, PropMap, StateMap,
};
pub use config::{DuplicatePolicy, RegistryConfig, RuntimeConfig, VitrineConfig};
pub use constants::*;
pub use error::{Error, Result};
pub use host::{
    BoundaryRef, DomAdapter, ElementRef, HostElement, MountTarget, StyleBoundary, UiEvent,
    UiListener,
};
pub use refs::{RefMap, RefSetter};
pub use store::{GlobalStore, StoreCallback, StoreChange, StoreState, StoreSubscription};
pub use telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use watch::{WatcherCallback, WatcherHandle, WatcherSet};
