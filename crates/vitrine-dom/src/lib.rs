//! Vitrine DOM
//!
//! In-memory render target for the Vitrine component runtime.
//!
//! Implements the `DomAdapter` contract from `vitrine-core` against a flat
//! element map: good enough for tests, headless rendering, and server-side
//! snapshots. A browser bridge implements the same traits against a live
//! document.

pub mod element;
pub mod memory;

pub use element::MemoryElement;
pub use memory::{MemoryBoundary, MemoryDom};
