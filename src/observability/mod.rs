//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one JSON line each)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (per-request spans with correlation tags)
//!
//! Consumers:
//!     → Log aggregation (stdout, picked up by the platform's collector)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace ids flow into every log line written during a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod record;
pub mod tracing;
