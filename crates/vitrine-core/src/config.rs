//! Configuration for Vitrine
//!
//! Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for Vitrine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitrineConfig {
    /// Runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl VitrineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.runtime.validate()?;
        self.registry.validate()?;
        Ok(())
    }
}

/// Per-instance runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum rendered markup size in bytes
    #[serde(default = "default_markup_size_max")]
    pub markup_size_bytes_max: usize,

    /// Maximum watchers per prop or state key
    #[serde(default = "default_watchers_per_key")]
    pub watchers_per_key_max: usize,
}

fn default_markup_size_max() -> usize {
    MARKUP_SIZE_BYTES_MAX
}

fn default_watchers_per_key() -> usize {
    WATCHERS_PER_KEY_COUNT_MAX
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            markup_size_bytes_max: default_markup_size_max(),
            watchers_per_key_max: default_watchers_per_key(),
        }
    }
}

impl RuntimeConfig {
    fn validate(&self) -> Result<()> {
        if self.markup_size_bytes_max == 0 {
            return Err(Error::InvalidConfiguration {
                field: "runtime.markup_size_bytes_max".into(),
                reason: "must be positive".into(),
            });
        }
        if self.markup_size_bytes_max > MARKUP_SIZE_BYTES_MAX {
            return Err(Error::InvalidConfiguration {
                field: "runtime.markup_size_bytes_max".into(),
                reason: format!("exceeds limit of {} bytes", MARKUP_SIZE_BYTES_MAX),
            });
        }
        Ok(())
    }
}

/// How the registry treats a second registration under an existing name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last writer wins; the prior definition is replaced
    #[default]
    Overwrite,
    /// The second registration is rejected with an error
    Reject,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Duplicate definition handling
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,

    /// Maximum live instances
    #[serde(default = "default_max_instances")]
    pub max_instances_count: usize,
}

fn default_max_instances() -> usize {
    INSTANCES_CONCURRENT_COUNT_MAX
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            on_duplicate: DuplicatePolicy::default(),
            max_instances_count: default_max_instances(),
        }
    }
}

impl RegistryConfig {
    fn validate(&self) -> Result<()> {
        if self.max_instances_count == 0 {
            return Err(Error::InvalidConfiguration {
                field: "registry.max_instances_count".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
