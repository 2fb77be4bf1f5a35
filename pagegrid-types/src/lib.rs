//! Core type definitions for PageGrid.
//!
//! This crate defines the small, storage-agnostic vocabulary shared by the
//! rest of the workspace:
//! - Area and tree-node identifiers
//! - The projection modes a persisted grid can be loaded in
//! - The tree levels and the editor keys each level uses
//!
//! Element types, field schemas and persistence live in `pagegrid-model`
//! and `pagegrid-storage`.

mod ids;
mod keys;
mod projection;

pub use ids::{AreaId, NodeId};
pub use keys::{ENABLED_KEY, ID_KEY, KIND_KEY, TreeLevel};
pub use projection::Projection;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid node id: {0:?}")]
    InvalidNodeId(String),

    #[error("unknown projection: {0}")]
    UnknownProjection(String),
}
