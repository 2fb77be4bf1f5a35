//! Editor configuration for the grid.
//!
//! The editor renders a grid as three nested replicators: sections hold a
//! replicator of rows, rows hold a replicator of elements, and every
//! registered element type contributes one set to the innermost level.

use pagegrid_model::{ElementRegistry, FieldDef, LevelFields};
use pagegrid_types::TreeLevel;
use serde::Serialize;
use serde_json::Value;

/// A named group of sets offered by one replicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetGroup {
    pub handle: String,
    pub display: String,
    pub sets: Vec<SetConfig>,
}

/// One kind of entry a replicator can add.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetConfig {
    pub handle: String,
    pub id: String,
    pub display: String,
    pub icon: String,
    /// Field configurations with their handle inlined.
    pub fields: Vec<Value>,
}

impl SetConfig {
    fn new(handle: &str, display: &str, icon: &str, fields: Vec<Value>) -> Self {
        Self {
            handle: handle.to_string(),
            id: handle.to_string(),
            display: display.to_string(),
            icon: icon.to_string(),
            fields,
        }
    }
}

/// The full set configuration for the grid field, top level first.
pub fn blueprint(registry: &ElementRegistry, sections: &LevelFields, rows: &LevelFields) -> Vec<SetGroup> {
    let element_sets = registry
        .iter()
        .map(|t| SetConfig::new(t.tag(), t.display_name(), t.icon_name(), field_configs(&t.field_schema())))
        .collect();
    let elements = group("Elements", element_sets);

    let mut row_fields = field_configs(rows.fields());
    row_fields.push(replicator(TreeLevel::Row, "Elements", "Add element", elements));
    let rows_group = group("Rows", vec![SetConfig::new(TreeLevel::Row.kind_tag(), "Row", "array", row_fields)]);

    let mut section_fields = field_configs(sections.fields());
    section_fields.push(replicator(TreeLevel::Section, "Rows", "Add row", rows_group));
    vec![group(
        "Sections",
        vec![SetConfig::new(TreeLevel::Section.kind_tag(), "Section", "array", section_fields)],
    )]
}

fn group(display: &str, sets: Vec<SetConfig>) -> SetGroup {
    SetGroup {
        handle: "main".to_string(),
        display: display.to_string(),
        sets,
    }
}

/// The nested-content field of a container level.
fn replicator(level: TreeLevel, display: &str, button_label: &str, sets: SetGroup) -> Value {
    serde_json::json!({
        "handle": level.children_key(),
        "display": display,
        "type": "replicator",
        "collapse": true,
        "previews": false,
        "button_label": button_label,
        "sets": [sets],
    })
}

fn field_configs(fields: &[FieldDef]) -> Vec<Value> {
    fields
        .iter()
        .map(|field| {
            let mut config = field.config.clone();
            config.insert("handle".into(), Value::String(field.key.clone()));
            Value::Object(config)
        })
        .collect()
}
