//! Correlation API
//!
//! A small HTTP API whose every log line is a JSON object carrying the
//! trace ids of the request that produced it.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request (X-Correlation-ID, x-datadog-* headers)
//!         │
//!         ▼
//!     ┌────────────────┐   ┌────────────────┐   ┌──────────────┐   ┌──────────┐
//!     │ trace_requests │──▶│ correlation    │──▶│  handlers    │──▶│  items   │
//!     │ (span per req) │   │ middleware     │   │ / /items /err│   │ service  │
//!     └────────────────┘   └────────────────┘   └──────────────┘   └──────────┘
//!             │                    │                    │                │
//!             └────────────────────┴────────┬───────────┴────────────────┘
//!                                           ▼
//!                              JsonLogLayer → stdout (one JSON object per line)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use correlation_api::config::{self, ConfigError};
use correlation_api::lifecycle::startup;
use correlation_api::observability::logging;
use correlation_api::observability::tracing::{RequestTracer, Tracer};

#[derive(Parser, Debug)]
#[command(name = "correlation-api", version, about = "HTTP API with JSON logs correlated to traces")]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long, env = "CORRELATION_API_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8000.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::from_env()?,
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(ConfigError::Validation)?;
    }

    let tracer: Arc<dyn Tracer> = Arc::new(RequestTracer::new(&config.tracing));
    logging::init(&config.logging, Some(tracer))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.tracing.service,
        bind_address = %config.listener.bind_address,
        log_level = %config.logging.level,
        tracing_enabled = config.tracing.enabled,
        logs_injection = config.logging.inject_trace_context,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
