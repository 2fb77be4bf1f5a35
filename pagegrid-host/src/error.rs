//! Error types for the host integration layer.

use crate::migrate::MigrationReport;
use pagegrid_model::RegistryError;
use pagegrid_storage::StorageError;
use thiserror::Error;

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("legacy item {index} is invalid: {reason}")]
    InvalidLegacyItem { index: usize, reason: String },

    /// A save failed mid-run; `report` covers the items handled before it.
    #[error("migration stopped at '{owner_key}' after {} entries: {source}", .report.migrated)]
    MigrationAborted {
        owner_key: String,
        report: Box<MigrationReport>,
        #[source]
        source: StorageError,
    },
}
