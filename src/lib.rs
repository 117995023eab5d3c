//! Correlation API Library

pub mod config;
pub mod http;
pub mod items;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
