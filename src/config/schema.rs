//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fallback logger and service name when `DD_SERVICE` is not set.
pub const DEFAULT_SERVICE_NAME: &str = "correlation-api";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// JSON logging settings.
    pub logging: LoggingConfig,

    /// Request tracing settings.
    pub tracing: TracingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Metrics exposition settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum severity (trace, debug, info, warning, error, critical).
    pub level: String,

    /// Value of the `logger` field on every line.
    pub logger_name: String,

    /// Inject the tracer's correlation fields into every line.
    pub inject_trace_context: bool,

    /// Per-target level overrides, e.g. `hyper = "warn"`.
    pub filters: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            logger_name: DEFAULT_SERVICE_NAME.to_string(),
            inject_trace_context: true,
            filters: BTreeMap::from([
                ("hyper".to_string(), "warn".to_string()),
                ("hyper_util".to_string(), "warn".to_string()),
                ("h2".to_string(), "warn".to_string()),
            ]),
        }
    }
}

/// Request tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Open a span for every request.
    pub enabled: bool,

    /// Service name reported as `dd.service`.
    pub service: String,

    /// Deployment environment reported as `dd.env`.
    pub env: Option<String>,

    /// Service version reported as `dd.version`.
    pub version: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service: DEFAULT_SERVICE_NAME.to_string(),
            env: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
