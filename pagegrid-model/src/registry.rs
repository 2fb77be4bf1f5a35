//! Catalog of element types keyed by tag.
//!
//! Built once while the host starts up and then shared read-only (behind an
//! `Arc`) with the persistence layer. Registration needs `&mut self`, so
//! concurrent registration during traffic is impossible without the caller
//! adding its own lock.

use crate::element::ElementType;
use crate::elements::{ImageElement, TextElement};
use crate::error::RegistryError;
use crate::field::{self, ColumnDef, RESERVED_COLUMNS};
use crate::{AssetResolver, RichTextRenderer};
use indexmap::IndexMap;
use pagegrid_types::{ENABLED_KEY, ID_KEY};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct ElementRegistry {
    types: IndexMap<String, Arc<dyn ElementType>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `text` and `image` types.
    pub fn with_builtin(
        renderer: Arc<dyn RichTextRenderer>,
        assets: Arc<dyn AssetResolver>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(TextElement::new(renderer))?;
        registry.register(ImageElement::new(assets))?;
        Ok(registry)
    }

    /// Registers a descriptor under its tag. The last registration for a tag
    /// wins; the tag keeps its original position in [`tags`](Self::tags).
    pub fn register(&mut self, descriptor: impl ElementType + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(descriptor))
    }

    /// Registers an already shared descriptor.
    pub fn register_shared(&mut self, descriptor: Arc<dyn ElementType>) -> Result<(), RegistryError> {
        self.check_capabilities(descriptor.as_ref())?;
        let tag = descriptor.tag().to_string();
        debug!(tag = %tag, "Element type registered");
        self.types.insert(tag, descriptor);
        Ok(())
    }

    fn check_capabilities(&self, descriptor: &dyn ElementType) -> Result<(), RegistryError> {
        let tag = descriptor.tag();
        let reject = |reason: String| RegistryError::InvalidType {
            tag: tag.to_string(),
            reason,
        };

        if tag.is_empty()
            || !tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(reject("tag must be non-empty and use only [a-z0-9_]".into()));
        }

        let columns = descriptor.storage_columns();
        let column_names: HashSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        for column in &columns {
            if !field::is_valid_identifier(&column.name) {
                return Err(reject(format!("column '{}' is not a valid column name", column.name)));
            }
            if RESERVED_COLUMNS.contains(&column.name.as_str()) {
                return Err(reject(format!("column '{}' is reserved", column.name)));
            }
        }

        let mut seen = HashSet::new();
        for field in descriptor.field_schema() {
            let key = field.key();
            if key.is_empty() {
                return Err(reject("field key must not be empty".into()));
            }
            if key == ID_KEY || key == ENABLED_KEY || RESERVED_COLUMNS.contains(&key) {
                return Err(reject(format!("field '{key}' is reserved")));
            }
            if !seen.insert(key.to_string()) {
                return Err(reject(format!("field '{key}' is declared twice")));
            }
            if !column_names.contains(key) {
                return Err(reject(format!("field '{key}' has no storage column")));
            }
        }

        // Every type shares one wide table, so a column name must mean the
        // same storage class for all types that declare it.
        for (other_tag, other) in &self.types {
            if other_tag == tag {
                continue;
            }
            for theirs in other.storage_columns() {
                if let Some(ours) = columns.iter().find(|c| c.name == theirs.name)
                    && ours.kind != theirs.kind
                {
                    return Err(reject(format!(
                        "column '{}' is {:?} here but {:?} in '{}'",
                        ours.name, ours.kind, theirs.kind, other_tag
                    )));
                }
            }
        }
        Ok(())
    }

    /// Looks up a descriptor. An unknown tag is not an error.
    pub fn resolve(&self, tag: &str) -> Option<&Arc<dyn ElementType>> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Registered descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ElementType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Removes every registration.
    pub fn reset(&mut self) {
        self.types.clear();
    }

    /// Union of all registered types' columns, first declaration wins.
    /// Element columns never carry a default: a row of one type leaves the
    /// columns of every other type null.
    pub fn element_columns(&self) -> Vec<ColumnDef> {
        let mut seen = HashSet::new();
        self.types
            .values()
            .flat_map(|t| t.storage_columns())
            .filter(|c| seen.insert(c.name.clone()))
            .map(|c| ColumnDef { default: None, ..c })
            .collect()
    }
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
