//! Error responses.
//!
//! # Responsibilities
//! - Map handler faults to HTTP status codes
//! - Render every fault as `{"detail": "..."}`
//!
//! # Design Decisions
//! - No fault maps to a 2xx status
//! - The detail is the fault's display string

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::items::ItemError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Faults surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Raised on purpose by `GET /error`.
    #[error("An intentional server error occurred.")]
    Intentional,

    /// Item processing failed.
    #[error(transparent)]
    Processing(#[from] ItemError),

    /// A path parameter could not be parsed.
    #[error("{0}")]
    InvalidPath(String),

    #[error("Not Found")]
    NotFound,

    /// A handler panicked.
    #[error("Internal Server Error")]
    Panic,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Intentional | ApiError::Processing(_) | ApiError::Panic => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidPath(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Response for a request whose handler panicked.
pub fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Panic.into_response()
}
