//! Route handlers.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::http::request::CorrelationIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::items::{ItemPayload, ItemRecord};
use crate::observability::logging::structured;

/// Payload of `GET /`.
pub const GREETING: &str = "Hello from Axum, traced with correlation IDs!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub message: String,
}

pub async fn read_root() -> Json<Greeting> {
    info!("Handling root endpoint request.");
    Json(Greeting {
        message: GREETING.to_string(),
    })
}

pub async fn read_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    item_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ItemRecord>, ApiError> {
    let Path(item_id) = item_id.map_err(|rejection| ApiError::InvalidPath(rejection.body_text()))?;

    let correlation_id = headers.correlation_id();
    info!(
        item_id_param = item_id,
        request_correlation_id = correlation_id.as_deref(),
        "Received request for item ID: {item_id}"
    );

    let mut data = ItemPayload::new();
    data.insert("name".to_string(), Value::String(format!("Product {item_id}")));

    match state.items.process_item_data(item_id, data) {
        Ok(record) => {
            info!(
                processed_result = %structured(&record),
                "Successfully processed item {item_id}"
            );
            Ok(Json(record))
        }
        Err(err) => {
            error!(
                item_id_param = item_id,
                error = %err,
                "Failed to process item {item_id} in API route: {err}"
            );
            Err(err.into())
        }
    }
}

pub async fn simulate_error() -> ApiError {
    error!("Simulating an intentional error in the /error endpoint.");
    ApiError::Intentional
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
