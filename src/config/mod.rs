//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (LOG_LEVEL, DD_SERVICE, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to logging, tracing and the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, from_env, load_config, ConfigError};
pub use schema::ServiceConfig;
pub use schema::{
    ListenerConfig, LoggingConfig, ObservabilityConfig, TimeoutConfig, TracingConfig,
};
pub use validation::{validate_config, ValidationError};
