//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use correlation_api::config::{LoggingConfig, ServiceConfig};
use correlation_api::observability::logging;
use correlation_api::observability::tracing::{ActiveSpan, LogCorrelation, TraceContext, Tracer};
use serde_json::Value;
use tracing::subscriber::DefaultGuard;

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Every captured line, parsed. Panics on a line that is not JSON.
    pub fn lines(&self) -> Vec<Value> {
        self.text()
            .lines()
            .map(|line| {
                serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
            })
            .collect()
    }

    /// Lines whose message is exactly `message`.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.lines()
            .into_iter()
            .filter(|line| line["message"] == message)
            .collect()
    }

    pub fn writer(&self) -> impl Fn() -> Capture + Send + Sync + 'static {
        let capture = self.clone();
        move || capture.clone()
    }
}

/// Tracer whose current span is always the same span.
pub struct FixedSpanTracer {
    pub span: Arc<ActiveSpan>,
}

impl FixedSpanTracer {
    pub fn new() -> Self {
        Self {
            span: Arc::new(ActiveSpan::new(TraceContext::root(), "test")),
        }
    }
}

impl Tracer for FixedSpanTracer {
    fn current_span(&self) -> Option<Arc<ActiveSpan>> {
        Some(Arc::clone(&self.span))
    }

    fn log_correlation_fields(&self) -> LogCorrelation {
        let context = self.span.context();
        LogCorrelation {
            trace_id: Some(context.trace_id.to_string()),
            span_id: Some(context.span_id.to_string()),
            service: Some("correlation-api-test".into()),
            ..LogCorrelation::default()
        }
    }
}

pub const TEST_LOGGER: &str = "correlation-api-test";

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.logging = LoggingConfig {
        level: "DEBUG".into(),
        logger_name: TEST_LOGGER.into(),
        ..LoggingConfig::default()
    };
    config.tracing.service = TEST_LOGGER.into();
    config
}

/// Route this thread's log events into a fresh [`Capture`] until the guard drops.
pub fn capture_logs(config: &ServiceConfig, tracer: Option<Arc<dyn Tracer>>) -> (Capture, DefaultGuard) {
    let capture = Capture::default();
    let (subscriber, _handle) = logging::subscriber(&config.logging, capture.writer(), tracer).unwrap();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_correlation(uri: &str, correlation_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Correlation-ID", correlation_id)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
