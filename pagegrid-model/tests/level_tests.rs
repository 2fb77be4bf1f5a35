use pagegrid_model::{FieldDef, LevelFields, RegistryError, extract_values, field_defaults};
use pagegrid_types::TreeLevel;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn obj(v: Value) -> serde_json::Map<String, Value> {
    v.as_object().cloned().unwrap()
}

// ── Built-in schemas ─────────────────────────────────────────────

#[test]
fn section_schema_has_background_color() {
    let sections = LevelFields::section();
    assert_eq!(sections.level(), TreeLevel::Section);
    assert_eq!(sections.field_keys().collect::<Vec<_>>(), vec!["background_color"]);
    assert_eq!(sections.defaults(), obj(json!({"background_color": "light"})));
}

#[test]
fn row_schema_is_empty() {
    let rows = LevelFields::row();
    assert!(rows.fields().is_empty());
    assert!(rows.defaults().is_empty());
    assert!(rows.extract_with_defaults(&obj(json!({"anything": 1}))).is_empty());
}

// ── Extraction ───────────────────────────────────────────────────

#[test]
fn default_applies_when_missing() {
    let values = LevelFields::section().extract_with_defaults(&obj(json!({"rows": []})));
    assert_eq!(values, obj(json!({"background_color": "light"})));
}

#[test]
fn input_overrides_default() {
    let values =
        LevelFields::section().extract_with_defaults(&obj(json!({"background_color": "dark"})));
    assert_eq!(values, obj(json!({"background_color": "dark"})));
}

#[test]
fn explicit_null_is_kept() {
    let values =
        LevelFields::section().extract_with_defaults(&obj(json!({"background_color": null})));
    assert_eq!(values, obj(json!({"background_color": null})));
}

#[test]
fn undeclared_keys_are_dropped() {
    let values = LevelFields::section()
        .extract_with_defaults(&obj(json!({"background_color": "dark", "colour": "red"})));
    assert!(!values.contains_key("colour"));
}

#[test]
fn field_without_default_is_omitted() {
    let fields = vec![FieldDef::text("css_class", "Class")];
    assert!(extract_values(&fields, &obj(json!({}))).is_empty());
    assert!(field_defaults(&fields).is_empty());
}

#[test]
fn defaults_follow_runtime_extension() {
    let mut rows = LevelFields::row();
    assert!(rows.defaults().is_empty());
    rows.push(FieldDef::text("gap", "Gap").with_default("md")).unwrap();
    assert_eq!(rows.defaults(), obj(json!({"gap": "md"})));
    rows.push(FieldDef::text("gap", "Gap").with_default("lg")).unwrap();
    assert_eq!(rows.fields().len(), 1);
    assert_eq!(rows.extract_with_defaults(&obj(json!({}))), obj(json!({"gap": "lg"})));
}

#[test]
fn levels_extend_independently() {
    let rows = LevelFields::row()
        .with_field(FieldDef::text("gap", "Gap"))
        .unwrap();
    let sections = LevelFields::section();
    assert_eq!(rows.fields().len(), 1);
    assert_eq!(sections.field_keys().collect::<Vec<_>>(), vec!["background_color"]);
}

#[test]
fn rejects_reserved_level_keys() {
    let mut sections = LevelFields::section();
    for key in ["rows", "_id", "type", "order", "enabled"] {
        let err = sections.push(FieldDef::text(key, "x")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidField { .. }), "{key} accepted");
    }
    // `elements` is only reserved on the row level
    sections.push(FieldDef::text("elements", "x")).unwrap();
    assert!(LevelFields::row().with_field(FieldDef::text("elements", "x")).is_err());
}

#[test]
fn read_back_fills_nulls() {
    let sections = LevelFields::section();
    assert_eq!(sections.read_back(&obj(json!({}))), obj(json!({"background_color": null})));
}

// ── Completeness ─────────────────────────────────────────────────

#[test]
fn completeness_requires_nested_key() {
    let sections = LevelFields::section();
    assert!(sections.is_complete(&json!({"rows": []})));
    assert!(!sections.is_complete(&json!({"background_color": "dark"})));
    assert!(!sections.is_complete(&json!({"rows": null})));
    assert!(!sections.is_complete(&json!("rows")));

    let rows = LevelFields::row();
    assert!(rows.is_complete(&json!({"elements": []})));
    assert!(!rows.is_complete(&json!({"rows": []})));
}

#[test]
fn children_ignores_non_arrays() {
    let sections = LevelFields::section();
    assert_eq!(sections.children(&json!({"rows": [1, 2]})).len(), 2);
    assert!(sections.children(&json!({"rows": "oops"})).is_empty());
    assert!(sections.children(&json!({})).is_empty());
}

// ── Field config serde ───────────────────────────────────────────

#[test]
fn field_def_reads_editor_layout() {
    let field: FieldDef = serde_json::from_value(json!({
        "handle": "spacing",
        "field": {"type": "select", "display": "Spacing", "default": "normal"}
    }))
    .unwrap();
    assert_eq!(field.key(), "spacing");
    assert_eq!(field.default_value(), Some(&json!("normal")));
    assert_eq!(field.column_def().default, Some(json!("normal")));
}
