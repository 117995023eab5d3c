//! Environment variable names read at startup.
//!
//! These are purely helpers; the schema types remain decoupled from
//! environment access.

/// Minimum log severity, e.g. `INFO` or `debug`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Logical service name. Used as the logger name and the tracer service.
pub const SERVICE_ENV: &str = "DD_SERVICE";

/// Deployment environment attached to correlation fields.
pub const ENV_ENV: &str = "DD_ENV";

/// Service version attached to correlation fields.
pub const VERSION_ENV: &str = "DD_VERSION";

/// Set to `false` to skip per-request span instrumentation.
pub const TRACE_ENABLED_ENV: &str = "DD_TRACE_ENABLED";

/// Set to `false` to stop injecting correlation fields into every line.
pub const LOGS_INJECTION_ENV: &str = "DD_LOGS_INJECTION";

/// Listen address, e.g. `127.0.0.1:8000`.
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";

/// Interpret a flag value. Unrecognized values yield `None`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
