//! Vitrine Runtime
//!
//! The per-instance state machine every stateful widget runs on.
//!
//! # Overview
//!
//! A [`ComponentRuntime`] owns one component's props, state, watchers, and
//! refs, and drives the lifecycle:
//!
//! ```text
//! Unmounted -> Mounting -> Mounted <-> Updating -> Unmounting -> Destroyed
//! ```
//!
//! Mounting runs `before_mount`, the first render, `mounted`, and the global
//! store subscription. Updates fire watchers, `before_update`, the render
//! pass, and `updated`, in that order, never interleaved within one call.
//! Teardown clears watchers, refs, the store subscription, and the host.

pub mod lifecycle;
pub mod runtime;

pub use lifecycle::{LifecycleState, RuntimeStats};
pub use runtime::ComponentRuntime;
