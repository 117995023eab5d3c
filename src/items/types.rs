//! Item domain types and errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Opaque input payload accompanying an item.
pub type ItemPayload = Map<String, Value>;

/// Processing state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Processed,
}

/// Result of processing one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: i64,
    pub name: String,
    pub status: ItemStatus,
    pub original_data: ItemPayload,
}

/// Errors that can occur while processing an item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    /// A payload field holds a value of the wrong JSON type.
    #[error("field '{field}' must be {expected}, got {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// JSON type name of `value`, for error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
