//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, correlation, panic recovery, timeout)
//! - Serve on a listener until shutdown is signalled
//!
//! # Layer order, outermost first
//! ```text
//! trace_requests        (only when tracing is enabled)
//!     → CatchPanicLayer  (panic → 500 {"detail": "Internal Server Error"})
//!     → correlation_middleware
//!     → TimeoutLayer     (408 after timeouts.request_secs)
//!     → handler
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::config::ServiceConfig;
use crate::http::handlers::{not_found, read_item, read_root, simulate_error};
use crate::http::middleware::correlation_middleware;
use crate::http::response::handle_panic;
use crate::items::ItemService;
use crate::lifecycle::ShutdownSignal;
use crate::observability::tracing::{trace_requests, RequestTracer, Tracer};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub tracer: Arc<dyn Tracer>,
    pub items: ItemService,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server whose requests are traced by a [`RequestTracer`].
    ///
    /// With `tracing.enabled = false` no span is opened, so correlation ids
    /// are logged as unattached.
    pub fn new(config: ServiceConfig) -> Self {
        let tracer = Arc::new(RequestTracer::new(&config.tracing));
        let instrumentation = config.tracing.enabled.then(|| Arc::clone(&tracer));

        let state = AppState {
            tracer,
            items: ItemService::new(),
        };

        let router = build_router(api_routes(), &config, state, instrumentation);
        Self { router, config }
    }

    /// Create a server that reads spans from `tracer` without opening any.
    pub fn with_tracer(config: ServiceConfig, tracer: Arc<dyn Tracer>) -> Self {
        let state = AppState {
            tracer,
            items: ItemService::new(),
        };

        let router = build_router(api_routes(), &config, state, None);
        Self { router, config }
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.tracing.service,
            tracing_enabled = self.config.tracing.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// The API's routes, before any middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(read_root))
        .route("/items/{item_id}", get(read_item))
        .route("/error", get(simulate_error))
        .fallback(not_found)
}

/// Wrap `routes` in the request middleware stack.
#[allow(deprecated)]
pub fn build_router(
    routes: Router<AppState>,
    config: &ServiceConfig,
    state: AppState,
    instrumentation: Option<Arc<RequestTracer>>,
) -> Router {
    let router = routes
        .with_state(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn_with_state(state, correlation_middleware))
        .layer(CatchPanicLayer::custom(handle_panic));

    match instrumentation {
        Some(tracer) => router.layer(middleware::from_fn_with_state(tracer, trace_requests)),
        None => router,
    }
}
