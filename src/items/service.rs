//! Item processing.
//!
//! Echoes its input into an [`ItemRecord`], logging on entry, on success
//! and on failure. Faults are returned to the caller untouched.

use serde_json::Value;
use tracing::{debug, error, info};

use crate::items::types::{json_type, ItemError, ItemPayload, ItemRecord, ItemStatus};
use crate::observability::logging::structured;

/// Simulated item processor.
#[derive(Debug, Clone, Default)]
pub struct ItemService;

impl ItemService {
    pub fn new() -> Self {
        Self
    }

    /// Process `data` for `item_id`.
    ///
    /// The record's `name` is `data["name"]` when it is a string, or
    /// `"Item {item_id}"` when the key is absent. A present `name` of any
    /// other JSON type, `null` included, is an [`ItemError::InvalidField`].
    pub fn process_item_data(
        &self,
        item_id: i64,
        data: ItemPayload,
    ) -> Result<ItemRecord, ItemError> {
        info!(item_id, "ItemService: Starting to process item ID: {item_id}");

        match build_record(item_id, data) {
            Ok(record) => {
                debug!(
                    processed_data = %structured(&record),
                    "ItemService: Successfully processed data for item ID: {item_id}"
                );
                Ok(record)
            }
            Err(err) => {
                error!(
                    item_id,
                    error = %err,
                    "ItemService: Error processing item ID {item_id}: {err}"
                );
                Err(err)
            }
        }
    }
}

fn build_record(item_id: i64, data: ItemPayload) -> Result<ItemRecord, ItemError> {
    let name = match data.get("name") {
        None => format!("Item {item_id}"),
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(ItemError::InvalidField {
                field: "name",
                expected: "a string",
                found: json_type(other),
            })
        }
    };

    Ok(ItemRecord {
        id: item_id,
        name,
        status: ItemStatus::Processed,
        original_data: data,
    })
}
