//! Request middleware.

pub mod correlation;

pub use correlation::{correlation_middleware, CORRELATION_TAG};
