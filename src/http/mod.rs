//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/correlation.rs (tag span, log start/finish)
//!     → handlers.rs (/, /items/{item_id}, /error)
//!     → response.rs (faults → status + {"detail": ...})
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{Greeting, GREETING};
pub use request::{CorrelationIdExt, X_CORRELATION_ID};
pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
