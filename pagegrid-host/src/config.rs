//! Grid configuration read from `pagegrid.toml`.

use crate::error::HostResult;
use pagegrid_model::{ElementRegistry, FieldDef, LevelFields};
use pagegrid_storage::{GridStore, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Database path that opens an in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// Grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_element_type")]
    pub default_element_type: String,
    /// Legacy field holding the embedded tree.
    #[serde(default = "default_field_handle")]
    pub field_handle: String,
    /// Fields appended to the built-in section schema.
    #[serde(default)]
    pub section_fields: Vec<FieldDef>,
    /// Fields appended to the built-in row schema.
    #[serde(default)]
    pub row_fields: Vec<FieldDef>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("pagegrid.db")
}

fn default_element_type() -> String {
    "text".to_string()
}

fn default_field_handle() -> String {
    "grid".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_element_type: default_element_type(),
            field_handle: default_field_handle(),
            section_fields: Vec::new(),
            row_fields: Vec::new(),
        }
    }
}

impl GridConfig {
    /// Loads configuration from an explicit path.
    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No grid config found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded grid config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse grid config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read grid config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> HostResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Built-in section and row schemas extended with the configured fields.
    pub fn store_options(&self) -> HostResult<StoreOptions> {
        let mut sections = LevelFields::section();
        for field in &self.section_fields {
            sections.push(field.clone())?;
        }
        let mut rows = LevelFields::row();
        for field in &self.row_fields {
            rows.push(field.clone())?;
        }
        Ok(StoreOptions {
            sections,
            rows,
            default_element_type: self.default_element_type.clone(),
        })
    }

    /// Opens the configured database with `registry`.
    pub fn open_store(&self, registry: Arc<ElementRegistry>) -> HostResult<GridStore> {
        let options = self.store_options()?;
        let store = if self.database_path.as_os_str() == IN_MEMORY {
            GridStore::open_in_memory_with(registry, options)?
        } else {
            GridStore::open_with(&self.database_path, registry, options)?
        };
        Ok(store)
    }
}
