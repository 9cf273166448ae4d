//! Telemetry and logging setup
//!
//! Structured logging via `tracing`, installed once per process.

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported in log lines
    pub service_name: String,
    /// Log level filter (env-filter syntax, e.g. "info" or "vitrine=debug")
    pub log_level: String,
    /// Whether to emit compact output suitable for terminals
    pub compact: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vitrine".to_string(),
            log_level: "info".to_string(),
            compact: true,
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Guard keeping telemetry alive for the process lifetime
pub struct TelemetryGuard {
    _private: (),
}

/// Install the global tracing subscriber
///
/// # Errors
/// Returns an error for an unparseable level filter or when a subscriber is
/// already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| Error::InvalidConfiguration {
        field: "telemetry.log_level".into(),
        reason: e.to_string(),
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.compact {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| Error::Internal {
        message: format!("failed to install tracing subscriber: {}", e),
    })?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = TelemetryConfig::default().with_log_level("not a level!!!");
        assert!(init_telemetry(&config).is_err());
    }

    #[test]
    fn test_builder_style() {
        let config = TelemetryConfig::new("portal").with_log_level("debug");
        assert_eq!(config.service_name, "portal");
        assert_eq!(config.log_level, "debug");
    }
}
