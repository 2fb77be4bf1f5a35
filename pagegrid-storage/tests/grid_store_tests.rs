use pagegrid_model::{ElementRegistry, ElementType, FieldDef, Fields, LevelFields, NoAssets, PassthroughRenderer};
use pagegrid_storage::{GridStore, StorageError, StoreOptions, TableCounts};
use pagegrid_types::{Projection, TreeLevel};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

fn builtin() -> ElementRegistry {
    ElementRegistry::with_builtin(Arc::new(PassthroughRenderer), Arc::new(NoAssets)).unwrap()
}

fn store() -> GridStore {
    GridStore::open_in_memory(Arc::new(builtin())).unwrap()
}

fn text(id: &str, title: &str) -> Value {
    json!({"_id": id, "type": "text", "enabled": true, "title": title, "content": null})
}

fn row(id: &str, elements: Vec<Value>) -> Value {
    json!({"_id": id, "type": "row", "enabled": true, "elements": elements})
}

fn section(id: &str, color: &str, rows: Vec<Value>) -> Value {
    json!({"_id": id, "type": "section", "enabled": true, "background_color": color, "rows": rows})
}

fn titles(tree: &[Value]) -> Vec<String> {
    tree.iter()
        .flat_map(|s| s["rows"].as_array().unwrap().iter())
        .flat_map(|r| r["elements"].as_array().unwrap().iter())
        .map(|e| e["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

struct VideoElement;

impl ElementType for VideoElement {
    fn tag(&self) -> &str {
        "video"
    }

    fn display_name(&self) -> &str {
        "Video"
    }

    fn icon_name(&self) -> &str {
        "video"
    }

    fn field_schema(&self) -> Vec<FieldDef> {
        vec![FieldDef::text("url", "URL"), FieldDef::text("caption", "Caption")]
    }
}

/// Declares only `quote` but also hands back another type's column.
struct QuoteElement;

impl ElementType for QuoteElement {
    fn tag(&self) -> &str {
        "quote"
    }

    fn display_name(&self) -> &str {
        "Quote"
    }

    fn icon_name(&self) -> &str {
        "quote"
    }

    fn field_schema(&self) -> Vec<FieldDef> {
        vec![FieldDef::text("quote", "Quote")]
    }

    fn project_for_storage(&self, raw: &Fields) -> Fields {
        let mut values = Fields::new();
        values.insert("quote".into(), raw.get("quote").cloned().unwrap_or(Value::Null));
        values.insert("alt".into(), json!("leaked"));
        values
    }
}

// ── Round trip ───────────────────────────────────────────────────

#[test]
fn edit_projection_round_trips_the_saved_tree() {
    let store = store();
    let tree = vec![section(
        "s1",
        "dark",
        vec![row(
            "r1",
            vec![json!({
                "_id": "e1",
                "type": "text",
                "enabled": true,
                "title": "Hello",
                "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Hi"}]}]
            })],
        )],
    )];

    let saved = store.save_tree("entry-1", &tree).unwrap();
    assert_eq!(saved.area.owner_key, "entry-1");
    assert_eq!((saved.stats.sections, saved.stats.rows, saved.stats.elements), (1, 1, 1));

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded, tree);
}

#[test]
fn render_projection_drops_bookkeeping_keys() {
    let store = store();
    let tree = vec![section("s1", "dark", vec![row("r1", vec![text("e1", "Hello")])])];
    store.save_tree("entry-1", &tree).unwrap();

    let rendered = store.load_tree("entry-1", Projection::Render).unwrap();
    assert_eq!(
        rendered,
        vec![json!({
            "type": "section",
            "background_color": "dark",
            "rows": [{
                "type": "row",
                "elements": [{"type": "text", "title": "Hello", "content": ""}]
            }]
        })]
    );
}

#[test]
fn section_defaults_fill_missing_fields() {
    let store = store();
    let tree = vec![json!({"type": "section", "rows": [{"type": "row", "elements": []}]})];
    store.save_tree("entry-1", &tree).unwrap();

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded[0]["background_color"], json!("light"));
    assert_eq!(loaded[0]["rows"][0]["elements"], json!([]));
}

#[test]
fn caller_ids_are_preserved_and_missing_ids_generated() {
    let store = store();
    let tree = vec![json!({
        "_id": "keep-me",
        "rows": [{"elements": [{"type": "text", "title": "A"}]}]
    })];
    store.save_tree("entry-1", &tree).unwrap();

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded[0]["_id"], json!("keep-me"));
    let row_id = loaded[0]["rows"][0]["_id"].as_str().unwrap();
    let element_id = loaded[0]["rows"][0]["elements"][0]["_id"].as_str().unwrap();
    assert!(!row_id.is_empty());
    assert!(!element_id.is_empty());
    assert_ne!(row_id, element_id);
}

#[test]
fn untyped_elements_use_the_default_type() {
    let store = store();
    let tree = vec![section("s1", "light", vec![row("r1", vec![json!({"_id": "e1", "title": "Plain"})])])];
    store.save_tree("entry-1", &tree).unwrap();

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    let element = &loaded[0]["rows"][0]["elements"][0];
    assert_eq!(element["type"], json!("text"));
    assert_eq!(element["title"], json!("Plain"));
}

#[test]
fn image_reference_is_unwrapped_for_storage_and_rewrapped_for_edit() {
    let store = store();
    let image = json!({"_id": "i1", "type": "image", "title": "Hero", "image": ["assets::hero.jpg"], "alt": "A hero"});
    store
        .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![image])])])
        .unwrap();

    let tree = store.load_entities("entry-1").unwrap().unwrap();
    let element = &tree.sections[0].rows[0].elements[0];
    assert_eq!(element.get("image"), Some(&json!("assets::hero.jpg")));

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded[0]["rows"][0]["elements"][0]["image"], json!(["assets::hero.jpg"]));

    let rendered = store.load_tree("entry-1", Projection::Render).unwrap();
    assert_eq!(rendered[0]["rows"][0]["elements"][0]["image"], json!(null));
}

// ── Replace semantics ────────────────────────────────────────────

#[test]
fn save_replaces_the_previous_tree() {
    let store = store();
    store
        .save_tree(
            "entry-1",
            &[
                section("s1", "light", vec![row("r1", vec![text("e1", "A"), text("e2", "B")])]),
                section("s2", "dark", vec![row("r2", vec![text("e3", "C")])]),
            ],
        )
        .unwrap();

    store
        .save_tree("entry-1", &[section("s3", "light", vec![row("r3", vec![text("e4", "D")])])])
        .unwrap();

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(titles(&loaded), vec!["D"]);
    assert_eq!(
        store.table_counts().unwrap(),
        TableCounts {
            areas: 1,
            sections: 1,
            rows: 1,
            elements: 1
        }
    );
}

#[test]
fn saving_an_empty_tree_keeps_the_area() {
    let store = store();
    store
        .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![text("e1", "A")])])])
        .unwrap();
    store.save_tree("entry-1", &[]).unwrap();

    assert!(store.has_area("entry-1").unwrap());
    assert!(store.load_tree("entry-1", Projection::Edit).unwrap().is_empty());
    assert_eq!(
        store.table_counts().unwrap(),
        TableCounts {
            areas: 1,
            ..TableCounts::default()
        }
    );
}

#[test]
fn resaving_keeps_the_area_identity() {
    let store = store();
    let first = store.save_tree("entry-1", &[]).unwrap();
    let second = store.save_tree("entry-1", &[]).unwrap();
    assert_eq!(first.area.id, second.area.id);
    assert_eq!(first.area.created_at, second.area.created_at);
    assert!(second.area.updated_at >= first.area.updated_at);
}

#[test]
fn owners_are_isolated() {
    let store = store();
    store
        .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![text("e1", "One")])])])
        .unwrap();
    store
        .save_tree("entry-2", &[section("s2", "dark", vec![row("r2", vec![text("e2", "Two")])])])
        .unwrap();
    store.save_tree("entry-1", &[]).unwrap();

    assert_eq!(titles(&store.load_tree("entry-2", Projection::Edit).unwrap()), vec!["Two"]);
    assert_eq!(
        store.counts("entry-1").unwrap(),
        TableCounts {
            areas: 1,
            ..TableCounts::default()
        }
    );
    assert_eq!(
        store.counts("entry-2").unwrap(),
        TableCounts {
            areas: 1,
            sections: 1,
            rows: 1,
            elements: 1
        }
    );
    assert_eq!(store.counts("nobody").unwrap(), TableCounts::default());
}

// ── Atomicity ────────────────────────────────────────────────────

#[test]
fn failed_save_rolls_back_to_the_previous_tree() {
    let store = store();
    let original = vec![section("s1", "light", vec![row("r1", vec![text("e1", "Original")])])];
    store.save_tree("entry-1", &original).unwrap();

    // The last element reuses an id already written in this save.
    let broken = vec![section(
        "s2",
        "dark",
        vec![row("r2", vec![text("dup", "A"), text("e3", "B"), text("dup", "C")])],
    )];
    let err = store.save_tree("entry-1", &broken).unwrap_err();
    assert!(matches!(err, StorageError::TransactionFailed { ref owner_key, .. } if owner_key == "entry-1"));

    assert_eq!(store.load_tree("entry-1", Projection::Edit).unwrap(), original);
}

#[test]
fn failed_first_save_leaves_no_area() {
    let store = store();
    let broken = vec![section("s1", "light", vec![row("r1", vec![text("dup", "A"), text("dup", "B")])])];
    assert!(store.save_tree("entry-1", &broken).is_err());
    assert!(!store.has_area("entry-1").unwrap());
    assert_eq!(store.table_counts().unwrap(), TableCounts::default());
}

// ── Order ────────────────────────────────────────────────────────

#[test]
fn element_order_follows_input_order() {
    let store = store();
    let tree = vec![section(
        "s1",
        "light",
        vec![row("r1", vec![text("b", "B"), text("a", "A"), text("c", "C")])],
    )];
    store.save_tree("entry-1", &tree).unwrap();
    assert_eq!(titles(&store.load_tree("entry-1", Projection::Edit).unwrap()), vec!["B", "A", "C"]);

    let reordered = vec![section(
        "s1",
        "light",
        vec![row("r1", vec![text("c", "C"), text("b", "B"), text("a", "A")])],
    )];
    store.save_tree("entry-1", &reordered).unwrap();
    assert_eq!(titles(&store.load_tree("entry-1", Projection::Edit).unwrap()), vec!["C", "B", "A"]);
}

#[test]
fn order_is_contiguous_among_persisted_siblings() {
    let store = store();
    let tree = vec![
        json!({"_id": "broken"}),
        section("s1", "light", vec![row("r1", vec![json!("not an element"), text("e1", "A"), text("e2", "B")])]),
        section("s2", "dark", vec![]),
    ];
    let saved = store.save_tree("entry-1", &tree).unwrap();
    assert_eq!(saved.stats.skipped_sections, 1);
    assert_eq!(saved.stats.skipped_elements, 1);

    let entities = store.load_entities("entry-1").unwrap().unwrap();
    let orders: Vec<u32> = entities.sections.iter().map(|s| s.section.order).collect();
    assert_eq!(orders, vec![0, 1]);
    let element_orders: Vec<u32> = entities.sections[0].rows[0].elements.iter().map(|e| e.order).collect();
    assert_eq!(element_orders, vec![0, 1]);
}

// ── Incomplete input ─────────────────────────────────────────────

#[test]
fn incomplete_containers_are_skipped_and_counted() {
    let store = store();
    let tree = vec![
        json!({"type": "section", "background_color": "dark"}),
        json!({"type": "section", "rows": null}),
        section(
            "s1",
            "light",
            vec![json!({"_id": "r-missing"}), row("r1", vec![text("e1", "Kept")])],
        ),
    ];
    let saved = store.save_tree("entry-1", &tree).unwrap();
    assert_eq!(saved.stats.sections, 1);
    assert_eq!(saved.stats.skipped_sections, 2);
    assert_eq!(saved.stats.rows, 1);
    assert_eq!(saved.stats.skipped_rows, 1);

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(titles(&loaded), vec!["Kept"]);
}

// ── Unknown types ────────────────────────────────────────────────

#[test]
fn unregistered_type_keeps_only_bookkeeping() {
    let store = store();
    let tree = vec![section(
        "s1",
        "light",
        vec![row("r1", vec![json!({"_id": "v1", "type": "video", "url": "https://example.com/v.mp4"})])],
    )];
    store.save_tree("entry-1", &tree).unwrap();

    let entities = store.load_entities("entry-1").unwrap().unwrap();
    let element = &entities.sections[0].rows[0].elements[0];
    assert_eq!(element.element_type, "video");
    assert!(element.values.is_empty());

    let edit = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(
        edit[0]["rows"][0]["elements"][0],
        json!({"_id": "v1", "enabled": true, "type": "video"})
    );
    let render = store.load_tree("entry-1", Projection::Render).unwrap();
    assert_eq!(render[0]["rows"][0]["elements"][0], json!({"type": "video"}));
}

#[test]
fn columns_outside_the_type_are_not_written() {
    let mut registry = builtin();
    registry.register(QuoteElement).unwrap();
    let store = GridStore::open_in_memory(Arc::new(registry)).unwrap();
    assert!(store.schema().element_kind("alt").is_some());

    let quote = json!({"_id": "q1", "type": "quote", "quote": "hi", "alt": "typed"});
    store
        .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![quote])])])
        .unwrap();

    let entities = store.load_entities("entry-1").unwrap().unwrap();
    let element = &entities.sections[0].rows[0].elements[0];
    assert_eq!(Value::Object(element.values.clone()), json!({"quote": "hi"}));
}

// ── Queries ──────────────────────────────────────────────────────

#[test]
fn missing_owner_loads_empty() {
    let store = store();
    assert!(store.load_tree("nobody", Projection::Edit).unwrap().is_empty());
    assert!(store.load_entities("nobody").unwrap().is_none());
    assert!(store.area("nobody").unwrap().is_none());
    assert!(!store.has_area("nobody").unwrap());
}

#[test]
fn custom_level_fields_become_columns() {
    let rows = LevelFields::row()
        .with_field(FieldDef::select("gap", "Gap", &[("none", "None"), ("wide", "Wide")], "none"))
        .unwrap();
    let options = StoreOptions {
        rows,
        ..StoreOptions::default()
    };
    let store = GridStore::open_in_memory_with(Arc::new(builtin()), options).unwrap();
    assert_eq!(store.schema().level_columns(TreeLevel::Row).len(), 1);

    let tree = vec![section(
        "s1",
        "light",
        vec![json!({"_id": "r1", "gap": "wide", "elements": []}), json!({"_id": "r2", "elements": []})],
    )];
    store.save_tree("entry-1", &tree).unwrap();

    let loaded = store.load_tree("entry-1", Projection::Edit).unwrap();
    assert_eq!(loaded[0]["rows"][0]["gap"], json!("wide"));
    assert_eq!(loaded[0]["rows"][1]["gap"], json!("none"));
}

// ── On disk ──────────────────────────────────────────────────────

#[test]
fn tree_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.db");
    let tree = vec![section("s1", "dark", vec![row("r1", vec![text("e1", "Persisted")])])];

    {
        let store = GridStore::open(&path, Arc::new(builtin())).unwrap();
        store.save_tree("entry-1", &tree).unwrap();
    }

    let store = GridStore::open(&path, Arc::new(builtin())).unwrap();
    assert_eq!(store.load_tree("entry-1", Projection::Edit).unwrap(), tree);
}

#[test]
fn timestamps_share_one_format_across_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.db");
    {
        let store = GridStore::open(&path, Arc::new(builtin())).unwrap();
        store
            .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![text("e1", "Stamped")])])])
            .unwrap();
    }

    let conn = rusqlite::Connection::open(&path).unwrap();
    let stamps: Vec<(String, String)> = ["grid_areas", "grid_sections", "grid_rows", "grid_elements"]
        .iter()
        .map(|table| {
            conn.query_row(&format!("SELECT created_at, updated_at FROM {table}"), [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap()
        })
        .collect();
    assert!(stamps.iter().all(|stamp| stamp == &stamps[0]), "{stamps:?}");
    assert_eq!(stamps[0].0, stamps[0].1);
}

#[test]
fn reopening_with_a_new_type_adds_its_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.db");
    {
        let store = GridStore::open(&path, Arc::new(builtin())).unwrap();
        store
            .save_tree("entry-1", &[section("s1", "light", vec![row("r1", vec![text("e1", "Before")])])])
            .unwrap();
    }

    let mut registry = builtin();
    registry.register(VideoElement).unwrap();
    let store = GridStore::open(&path, Arc::new(registry)).unwrap();
    assert!(store.schema().element_kind("url").is_some());

    let video = json!({"_id": "v1", "type": "video", "url": "https://example.com/v.mp4", "caption": "Clip"});
    store
        .save_tree(
            "entry-1",
            &[section("s1", "light", vec![row("r1", vec![text("e1", "Before"), video])])],
        )
        .unwrap();

    let loaded = store.load_tree("entry-1", Projection::Render).unwrap();
    assert_eq!(
        loaded[0]["rows"][0]["elements"][1],
        json!({"type": "video", "url": "https://example.com/v.mp4", "caption": "Clip"})
    );
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn saved_titles_load_back_in_order(shape in prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 0..4)) {
        let store = store();
        let mut next = 0usize;
        let mut expected = Vec::new();
        let tree: Vec<Value> = shape
            .iter()
            .enumerate()
            .map(|(s, rows)| {
                let rows = rows
                    .iter()
                    .enumerate()
                    .map(|(r, count)| {
                        let elements = (0..*count)
                            .map(|_| {
                                next += 1;
                                let title = format!("t{next}");
                                expected.push(title.clone());
                                text(&format!("e{next}"), &title)
                            })
                            .collect();
                        row(&format!("r{s}-{r}"), elements)
                    })
                    .collect();
                section(&format!("s{s}"), "light", rows)
            })
            .collect();

        let saved = store.save_tree("entry", &tree).unwrap();
        prop_assert_eq!(saved.stats.elements, expected.len());
        let loaded = store.load_tree("entry", Projection::Edit).unwrap();
        prop_assert_eq!(titles(&loaded), expected);
        prop_assert_eq!(loaded, tree);
    }
}
