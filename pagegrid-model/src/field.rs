use crate::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns every element row carries regardless of its type.
/// Field keys must never collide with these.
pub const RESERVED_COLUMNS: &[&str] = &["id", "row_id", "section_id", "area_id", "type", "order", "created_at", "updated_at"];

/// The SQL storage class of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Integer,
    Real,
    Boolean,
    /// Serialised JSON stored as text.
    Json,
}

impl ColumnKind {
    /// SQLite column type used when provisioning.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text | Self::Json => "TEXT",
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
        }
    }
}

/// A physical column owned by an element type or a container level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    /// Column default, only used by level columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Shorthand for a nullable text column.
    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// Shorthand for a JSON column.
    pub fn json(name: &str) -> Self {
        Self::new(name, ColumnKind::Json)
    }
}

/// An editable field: its key plus an opaque editor configuration.
///
/// The configuration is handed to the editing UI untouched; the core only
/// reads its `default`. The serialised form mirrors the editor's
/// `{"handle": ..., "field": {...}}` layout so field lists can be read from
/// configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "handle")]
    pub key: String,
    #[serde(default, rename = "field")]
    pub config: Fields,
    /// Storage class of the backing column.
    #[serde(default)]
    pub column: ColumnKind,
}

impl FieldDef {
    pub fn new(key: &str, field_type: &str, display: &str) -> Self {
        let mut config = Fields::new();
        config.insert("type".into(), Value::from(field_type));
        config.insert("display".into(), Value::from(display));
        Self {
            key: key.into(),
            config,
            column: ColumnKind::Text,
        }
    }

    /// Shorthand for a plain text field.
    pub fn text(key: &str, display: &str) -> Self {
        Self::new(key, "text", display)
    }

    /// Shorthand for a choice field with fixed options and a default.
    pub fn select(key: &str, display: &str, options: &[(&str, &str)], default: &str) -> Self {
        let options: Fields = options
            .iter()
            .map(|(value, label)| ((*value).to_string(), Value::from(*label)))
            .collect();
        Self::new(key, "select", display)
            .with("options", Value::Object(options))
            .with_default(default)
    }

    /// Sets an arbitrary editor configuration entry.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Declares the value used when input omits this field.
    #[must_use]
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        self.with("default", value)
    }

    /// Changes the storage class of the backing column.
    #[must_use]
    pub fn stored_as(mut self, kind: ColumnKind) -> Self {
        self.column = kind;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The declared default, if any. `null` counts as no default.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.config.get("default").filter(|v| !v.is_null())
    }

    /// The column this field is stored in.
    #[must_use]
    pub fn column_def(&self) -> ColumnDef {
        ColumnDef {
            name: self.key.clone(),
            kind: self.column,
            default: self.default_value().cloned(),
        }
    }
}

/// Whether `name` can be used verbatim as a column name.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Declared defaults, recomputed from the schema on every call.
#[must_use]
pub fn field_defaults(fields: &[FieldDef]) -> Fields {
    fields
        .iter()
        .filter_map(|f| f.default_value().map(|v| (f.key.clone(), v.clone())))
        .collect()
}

/// Values for the declared keys: the input's value when the key is present
/// (even if null), else the declared default, else omitted.
#[must_use]
pub fn extract_values(fields: &[FieldDef], raw: &Fields) -> Fields {
    let mut values = field_defaults(fields);
    for field in fields {
        if let Some(v) = raw.get(&field.key) {
            values.insert(field.key.clone(), v.clone());
        }
    }
    values
}

/// The input's values for the declared keys, without defaults.
#[must_use]
pub fn select_declared(fields: &[FieldDef], raw: &Fields) -> Fields {
    fields
        .iter()
        .filter_map(|f| raw.get(&f.key).map(|v| (f.key.clone(), v.clone())))
        .collect()
}

/// Reads the declared keys back off a stored record; missing values are null.
#[must_use]
pub fn read_back(fields: &[FieldDef], stored: &Fields) -> Fields {
    fields
        .iter()
        .map(|f| (f.key.clone(), stored.get(&f.key).cloned().unwrap_or(Value::Null)))
        .collect()
}
