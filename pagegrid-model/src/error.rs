//! Error types for the element registry.

use thiserror::Error;

/// Errors raised while registering element types or extending level schemas.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The descriptor does not satisfy the required capability set.
    #[error("invalid element type '{tag}': {reason}")]
    InvalidType { tag: String, reason: String },

    /// A level field cannot be declared.
    #[error("invalid {level} field '{key}': {reason}")]
    InvalidField {
        level: pagegrid_types::TreeLevel,
        key: String,
        reason: String,
    },
}
