//! Item processing subsystem.
//!
//! # Data Flow
//! ```text
//! GET /items/{item_id}
//!     → handler builds payload {"name": "Product {item_id}"}
//!     → service.rs (echo into ItemRecord, log each step)
//!     → Ok(ItemRecord) → 200
//!     → Err(ItemError) → 500 {"detail": ...}
//! ```

pub mod service;
pub mod types;

pub use service::ItemService;
pub use types::{ItemError, ItemPayload, ItemRecord, ItemStatus};
