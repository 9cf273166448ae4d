//! Registry error types
//!
//! Explicit error variants with context.

use thiserror::Error;

/// Registry-specific errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No definition exists under the requested name
    #[error("no component registered under name: {name}")]
    UnregisteredComponent { name: String },

    /// No live instance exists under the requested id
    #[error("instance not found: {id}")]
    InstanceNotFound { id: String },

    /// A definition already exists and the registry rejects duplicates
    #[error("component already registered: {name}")]
    DuplicateDefinition { name: String },

    /// The definition's name failed validation
    #[error("invalid definition: {name}, reason: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Mounting a freshly created instance failed
    ///
    /// The instance record is kept, unmounted; the caller owns destroying it
    /// via the id carried here.
    #[error("mount failed for instance {id}: {source}")]
    MountFailed {
        id: String,
        #[source]
        source: vitrine_core::Error,
    },

    /// An operation forwarded to a live instance failed
    #[error("instance {id} operation failed: {source}")]
    Component {
        id: String,
        #[source]
        source: vitrine_core::Error,
    },

    /// Internal registry error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RegistryError {
    /// Create an unregistered-component error
    pub fn unregistered(name: impl Into<String>) -> Self {
        Self::UnregisteredComponent { name: name.into() }
    }

    /// Create an instance-not-found error
    pub fn instance_not_found(id: impl Into<String>) -> Self {
        Self::InstanceNotFound { id: id.into() }
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
