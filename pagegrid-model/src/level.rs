//! Custom-field policies of the Section and Row levels.
//!
//! Both levels follow the same rule: a declared field takes the input's value
//! when present, otherwise its declared default, otherwise it is omitted.
//! Each level keeps its own field list so projects can extend one without
//! touching the other.

use crate::error::RegistryError;
use crate::field::{self, ColumnDef, FieldDef, RESERVED_COLUMNS};
use crate::Fields;
use pagegrid_types::{ENABLED_KEY, ID_KEY, TreeLevel};
use serde_json::Value;

/// Declared custom fields of one container level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFields {
    level: TreeLevel,
    fields: Vec<FieldDef>,
}

impl LevelFields {
    /// Built-in section schema: a background colour choice defaulting to `light`.
    pub fn section() -> Self {
        Self {
            level: TreeLevel::Section,
            fields: vec![FieldDef::select(
                "background_color",
                "Background Color",
                &[("light", "Light"), ("dark", "Dark")],
                "light",
            )],
        }
    }

    /// Built-in row schema: no custom fields.
    pub fn row() -> Self {
        Self {
            level: TreeLevel::Row,
            fields: Vec::new(),
        }
    }

    /// An empty schema for `level`.
    pub fn empty(level: TreeLevel) -> Self {
        Self {
            level,
            fields: Vec::new(),
        }
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_field(mut self, field: FieldDef) -> Result<Self, RegistryError> {
        self.push(field)?;
        Ok(self)
    }

    /// Declares an additional field. A field with the same key is replaced.
    pub fn push(&mut self, field: FieldDef) -> Result<(), RegistryError> {
        self.check(&field)?;
        match self.fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        Ok(())
    }

    fn check(&self, field: &FieldDef) -> Result<(), RegistryError> {
        let reject = |reason: &str| RegistryError::InvalidField {
            level: self.level,
            key: field.key.clone(),
            reason: reason.to_string(),
        };
        if !field::is_valid_identifier(&field.key) {
            return Err(reject("not a valid column name"));
        }
        if RESERVED_COLUMNS.contains(&field.key.as_str())
            || field.key == ID_KEY
            || field.key == ENABLED_KEY
            || field.key == self.level.children_key()
        {
            return Err(reject("key is reserved"));
        }
        Ok(())
    }

    #[must_use]
    pub fn level(&self) -> TreeLevel {
        self.level
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDef::key)
    }

    /// Declared defaults, recomputed on every call.
    #[must_use]
    pub fn defaults(&self) -> Fields {
        field::field_defaults(&self.fields)
    }

    /// Field values for a raw editor entry with defaults applied.
    #[must_use]
    pub fn extract_with_defaults(&self, raw: &Fields) -> Fields {
        field::extract_values(&self.fields, raw)
    }

    /// Field values read back off a persisted record.
    #[must_use]
    pub fn read_back(&self, stored: &Fields) -> Fields {
        field::read_back(&self.fields, stored)
    }

    /// Physical columns backing the declared fields.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnDef> {
        self.fields.iter().map(FieldDef::column_def).collect()
    }

    /// Whether a raw entry carries this level's nested-content key.
    /// Entries without it are incomplete editor state.
    #[must_use]
    pub fn is_complete(&self, raw: &Value) -> bool {
        raw.as_object()
            .and_then(|o| o.get(self.level.children_key()))
            .is_some_and(|v| !v.is_null())
    }

    /// The nested entries of a raw entry; anything but an array yields none.
    #[must_use]
    pub fn children<'a>(&self, raw: &'a Value) -> &'a [Value] {
        raw.get(self.level.children_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
