//! Glue between PageGrid and a surrounding content system.
//!
//! - [`GridField`] plays the grid field type: it saves submitted trees,
//!   feeds the editor and feeds templates
//! - [`EditContext`] carries the per-request [`PendingEdits`] buffer used
//!   while an entry has no id yet
//! - [`blueprint`] builds the nested editor configuration
//! - [`LegacyMigrator`] moves embedded legacy trees into the grid tables
//! - [`GridConfig`] reads `pagegrid.toml`

mod blueprint;
mod config;
mod error;
mod field;
mod migrate;
mod pending;

pub use blueprint::{SetConfig, SetGroup, blueprint};
pub use config::{GridConfig, IN_MEMORY};
pub use error::{HostError, HostResult};
pub use field::{ENTRY_MARKER_KEY, EntryRef, GridField};
pub use migrate::{LegacyItem, LegacyMigrator, MigrationPreview, MigrationReport};
pub use pending::{EditContext, PendingEdits};
