//! Correlation ID middleware.
//!
//! # Responsibilities
//! - Tag the active span with the caller's `X-Correlation-ID`
//! - Log the start, finish or failure of every request
//! - Record request metrics
//!
//! # Data Flow
//! ```text
//! Request
//!     → read X-Correlation-ID
//!     → tag current span (or warn when there is none)
//!     → log "Request started"
//!     → inner service
//!         → response: log "Request finished" → return it unchanged
//!         → panic:    log "Request failed"   → resume the panic
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use tracing::{debug, warn};

use crate::http::request::CorrelationIdExt;
use crate::http::server::AppState;
use crate::observability::metrics::{self, UNMATCHED_ROUTE};

/// Span tag holding the caller's correlation identifier.
pub const CORRELATION_TAG: &str = "correlation_id";

/// Log a request lifecycle event with the request's path, method and
/// trace-correlation fields.
macro_rules! request_event {
    ($level:ident, $path:expr, $method:expr, $correlation:expr, $($rest:tt)+) => {
        tracing::$level!(
            path = %$path,
            method = %$method,
            dd.trace_id = $correlation.trace_id.as_deref(),
            dd.span_id = $correlation.span_id.as_deref(),
            dd.service = $correlation.service.as_deref(),
            dd.env = $correlation.env.as_deref(),
            dd.version = $correlation.version.as_deref(),
            $($rest)+
        )
    };
}

pub async fn correlation_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_string();

    if let Some(correlation_id) = request.correlation_id() {
        match state.tracer.current_span() {
            Some(span) => {
                span.set_tag(CORRELATION_TAG, correlation_id.as_ref());
                debug!("Attached X-Correlation-ID '{correlation_id}' to current span.");
            }
            None => warn!(
                "Received X-Correlation-ID '{correlation_id}' but no active span to attach to. \
                 This might indicate an issue with tracing instrumentation."
            ),
        }
    }

    let correlation = state.tracer.log_correlation_fields();
    request_event!(info, path, method, correlation, "Request started");

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            request_event!(
                error,
                path,
                method,
                correlation,
                error = panic_message(panic.as_ref()),
                "Request failed"
            );
            std::panic::resume_unwind(panic);
        }
    };

    let status = response.status().as_u16();
    request_event!(info, path, method, correlation, status_code = status, "Request finished");
    metrics::record_request(method.as_str(), status, &route, start);

    response
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("handler panicked")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let formatted: Box<dyn Any + Send> = Box::new(format!("item {}", 5));
        let opaque: Box<dyn Any + Send> = Box::new(5_u8);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(formatted.as_ref()), "item 5");
        assert_eq!(panic_message(opaque.as_ref()), "handler panicked");
    }
}
