//! Vitrine Registry
//!
//! The process-wide catalog behind the widget toolkit.
//!
//! # Overview
//!
//! The registry provides:
//! - Definition storage (name, factory, singleton/lazy flags)
//! - Instance creation, tracking, and teardown
//! - Bulk lifecycle fan-out (`destroy_by_name`, `destroy_all`)
//! - A fire-and-forget message bus (`broadcast`, `send`)
//! - Read-only inspection (`registry_info`)
//!
//! A [`ComponentRegistry`] is an explicit context object: construct one per
//! application (or per test) and pass it to call sites.

pub mod definition;
pub mod error;
pub mod registry;

pub use definition::{ComponentDefinition, ComponentFactory};
pub use error::{RegistryError, RegistryResult};
pub use registry::{ComponentRegistry, InstanceInfo, InstanceSnapshot, RegistryInfo};
