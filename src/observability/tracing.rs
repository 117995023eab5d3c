//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests
//! - Open one span per request and keep it reachable while the request runs
//! - Expose the active span and log-correlation fields through [`Tracer`]
//!
//! # Design Decisions
//! - Callers only see the [`Tracer`] capability; [`NoopTracer`] satisfies it
//!   when no tracing is wired in
//! - The active span lives in a tokio task-local, scoped to the request future
//! - Continues Datadog `x-datadog-trace-id` / `x-datadog-parent-id` headers
//! - Spans are not exported; finishing a span logs it at debug

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use tracing::Instrument;

use crate::config::TracingConfig;
use crate::observability::logging::structured;

/// Incoming trace id header.
pub const X_DATADOG_TRACE_ID: &str = "x-datadog-trace-id";

/// Incoming parent span id header.
pub const X_DATADOG_PARENT_ID: &str = "x-datadog-parent-id";

tokio::task_local! {
    static ACTIVE_SPAN: Arc<ActiveSpan>;
}

/// Identifiers tying a span to its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: u64,
    pub span_id: u64,
    pub parent_id: Option<u64>,
}

impl TraceContext {
    /// Start a new trace.
    pub fn root() -> Self {
        Self {
            trace_id: new_id(),
            span_id: new_id(),
            parent_id: None,
        }
    }

    /// Continue a trace propagated by an upstream caller.
    ///
    /// Both headers must be present and hold non-zero decimal ids.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let trace_id = header_id(headers, X_DATADOG_TRACE_ID)?;
        let parent_id = header_id(headers, X_DATADOG_PARENT_ID)?;
        Some(Self {
            trace_id,
            span_id: new_id(),
            parent_id: Some(parent_id),
        })
    }
}

fn header_id(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
}

fn new_id() -> u64 {
    rand::thread_rng().gen_range(1..=u64::MAX)
}

/// A unit of traced work, open for the lifetime of one request.
#[derive(Debug)]
pub struct ActiveSpan {
    context: TraceContext,
    resource: String,
    started: Instant,
    tags: Mutex<BTreeMap<String, String>>,
}

impl ActiveSpan {
    pub fn new(context: TraceContext, resource: impl Into<String>) -> Self {
        Self {
            context,
            resource: resource.into(),
            started: Instant::now(),
            tags: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn context(&self) -> TraceContext {
        self.context
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Set a tag, replacing any previous value under `key`.
    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock_tags().insert(key.into(), value.into());
    }

    pub fn tag(&self, key: &str) -> Option<String> {
        self.lock_tags().get(key).cloned()
    }

    /// Snapshot of all tags.
    pub fn tags(&self) -> BTreeMap<String, String> {
        self.lock_tags().clone()
    }

    fn lock_tags(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // Tags are plain strings; a panic mid-insert leaves nothing to repair.
        self.tags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fields that link a log line to a trace. Unset fields are not emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCorrelation {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub service: Option<String>,
    pub env: Option<String>,
    pub version: Option<String>,
}

impl LogCorrelation {
    /// Set fields under their log keys (`dd.trace_id`, ...).
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("dd.trace_id", &self.trace_id),
            ("dd.span_id", &self.span_id),
            ("dd.service", &self.service),
            ("dd.env", &self.env),
            ("dd.version", &self.version),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
    }
}

/// Access to the tracing system, as seen by request-handling code.
pub trait Tracer: Send + Sync {
    /// The span of the request currently executing, if any.
    fn current_span(&self) -> Option<Arc<ActiveSpan>>;

    /// Fields to merge into log lines for correlation with traces.
    fn log_correlation_fields(&self) -> LogCorrelation;
}

/// Tracer used when no tracing system is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn current_span(&self) -> Option<Arc<ActiveSpan>> {
        None
    }

    fn log_correlation_fields(&self) -> LogCorrelation {
        LogCorrelation::default()
    }
}

/// In-process tracer backing [`trace_requests`].
#[derive(Debug, Clone)]
pub struct RequestTracer {
    service: String,
    env: Option<String>,
    version: Option<String>,
}

impl RequestTracer {
    pub fn new(config: &TracingConfig) -> Self {
        Self {
            service: config.service.clone(),
            env: config.env.clone().filter(|env| !env.is_empty()),
            version: Some(config.version.clone()).filter(|version| !version.is_empty()),
        }
    }

    /// Run `future` with `span` as the active span.
    pub async fn in_span<F: Future>(span: Arc<ActiveSpan>, future: F) -> F::Output {
        ACTIVE_SPAN.scope(span, future).await
    }
}

impl Tracer for RequestTracer {
    fn current_span(&self) -> Option<Arc<ActiveSpan>> {
        ACTIVE_SPAN.try_with(Arc::clone).ok()
    }

    fn log_correlation_fields(&self) -> LogCorrelation {
        // Ids read "0" outside a span so the keys are always present.
        let context = self.current_span().map(|span| span.context());
        LogCorrelation {
            trace_id: Some(context.map_or(0, |c| c.trace_id).to_string()),
            span_id: Some(context.map_or(0, |c| c.span_id).to_string()),
            service: Some(self.service.clone()),
            env: self.env.clone(),
            version: self.version.clone(),
        }
    }
}

/// Middleware that opens a span around each request.
pub async fn trace_requests(
    State(tracer): State<Arc<RequestTracer>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let context = TraceContext::from_headers(request.headers()).unwrap_or_else(TraceContext::root);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = Arc::new(ActiveSpan::new(context, format!("{method} {path}")));
    span.set_tag("http.method", method.as_str());
    span.set_tag("http.url", path.as_str());

    let request_span = tracing::info_span!(
        "http.request",
        dd.trace_id = %context.trace_id,
        dd.span_id = %context.span_id,
        service = %tracer.service,
    );

    let active = Arc::clone(&span);
    RequestTracer::in_span(span, async move {
        let response = next.run(request).await;
        let status = response.status();

        active.set_tag("http.status_code", status.as_str());
        if status.is_server_error() {
            active.set_tag("error", "true");
        }

        tracing::debug!(
            resource = %active.resource(),
            duration_ms = active.elapsed().as_secs_f64() * 1000.0,
            parent_id = active.context().parent_id.unwrap_or(0),
            tags = %structured(&active.tags()),
            "Span finished"
        );

        response
    })
    .instrument(request_span)
    .await
}
