//! Error types for Vitrine
//!
//! Explicit error variants with context, using thiserror.

use thiserror::Error;

/// Result type alias for Vitrine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vitrine error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Mount Errors
    // =========================================================================
    #[error("host not found for mount target: {target}")]
    HostNotFound { target: String },

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    #[error("instance {id} cannot {operation} while {state}")]
    LifecycleViolation {
        id: String,
        state: String,
        operation: String,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("invalid type name: {name}, reason: {reason}")]
    InvalidTypeName { name: String, reason: String },

    #[error("type name too long: {length} bytes exceeds limit of {limit} bytes")]
    TypeNameTooLong { length: usize, limit: usize },

    #[error("rendered markup too large: {size} bytes exceeds limit of {limit} bytes")]
    MarkupTooLarge { size: usize, limit: usize },

    #[error("invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    // =========================================================================
    // Hook Errors
    // =========================================================================
    #[error("hook {hook} failed: {reason}")]
    Hook { hook: String, reason: String },

    // =========================================================================
    // Internal
    // =========================================================================
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a hook failure error
    ///
    /// For widget authors reporting a failure from inside a lifecycle hook.
    pub fn hook(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
