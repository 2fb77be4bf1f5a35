//! SQLite storage layer for PageGrid.
//!
//! Persists grid trees as four normalized tables (areas, sections, rows,
//! elements) and loads them back in edit or render shape.
//!
//! # Architecture
//!
//! - Saves replace an area's whole subtree inside one transaction
//! - Section and row fields and element type fields map to typed columns
//! - Columns introduced by newly registered element types are added on open
//! - Loads issue one query per level, scoped to the area

mod codec;
mod error;
mod projection;
mod schema;
mod store;

pub use error::{StorageError, StorageResult};
pub use projection::Projector;
pub use schema::GridSchema;
pub use store::{GridStore, SavedTree, StoreOptions, TableCounts};
