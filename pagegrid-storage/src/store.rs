//! Whole-tree persistence for grid areas.
//!
//! A save replaces the area's entire subtree inside one transaction: the
//! area is found or created, its sections are deleted (rows and elements
//! follow by cascade) and the submitted tree is inserted from scratch.
//! There is no diffing. Concurrent saves for the same owner are not
//! serialized here; the last committed save wins.

use crate::codec;
use crate::error::{StorageError, StorageResult};
use crate::projection::Projector;
use crate::schema::{self, AREAS, ELEMENTS, GridSchema};
use chrono::{DateTime, Utc};
use pagegrid_model::{
    Area, ColumnDef, Element, ElementRegistry, Fields, GridTree, LevelFields, Row, RowNode,
    Section, SectionNode, TreeStats,
};
use pagegrid_types::{AreaId, ID_KEY, KIND_KEY, NodeId, Projection, TreeLevel};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, OptionalExtension, ToSql, Transaction, params};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Tree-level configuration of a [`GridStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub sections: LevelFields,
    pub rows: LevelFields,
    /// Tag assumed for elements that do not name a type.
    pub default_element_type: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sections: LevelFields::section(),
            rows: LevelFields::row(),
            default_element_type: "text".into(),
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedTree {
    pub area: Area,
    pub stats: TreeStats,
}

/// Row counts across all grid tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub areas: usize,
    pub sections: usize,
    pub rows: usize,
    pub elements: usize,
}

/// SQLite-backed store of normalized grid trees.
pub struct GridStore {
    conn: Arc<Mutex<Connection>>,
    registry: Arc<ElementRegistry>,
    options: StoreOptions,
    schema: GridSchema,
}

impl GridStore {
    /// Opens (or creates) a store at the given path with the built-in levels.
    pub fn open(path: impl AsRef<Path>, registry: Arc<ElementRegistry>) -> StorageResult<Self> {
        Self::open_with(path, registry, StoreOptions::default())
    }

    /// Opens (or creates) a store at the given path.
    pub fn open_with(
        path: impl AsRef<Path>,
        registry: Arc<ElementRegistry>,
        options: StoreOptions,
    ) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn, registry, options)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(registry: Arc<ElementRegistry>) -> StorageResult<Self> {
        Self::open_in_memory_with(registry, StoreOptions::default())
    }

    pub fn open_in_memory_with(registry: Arc<ElementRegistry>, options: StoreOptions) -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, registry, options)
    }

    /// Wraps an open connection, enabling foreign keys and provisioning the schema.
    pub fn from_connection(
        conn: Connection,
        registry: Arc<ElementRegistry>,
        options: StoreOptions,
    ) -> StorageResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let schema = GridSchema::new(&options.sections, &options.rows, &registry);
        schema
            .provision(&conn)
            .map_err(|e| StorageError::Schema(format!("failed to provision grid tables: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            registry,
            options,
            schema,
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn schema(&self) -> &GridSchema {
        &self.schema
    }

    fn level(&self, level: TreeLevel) -> &LevelFields {
        match level {
            TreeLevel::Section => &self.options.sections,
            TreeLevel::Row => &self.options.rows,
        }
    }

    // ── Save ─────────────────────────────────────────────────────

    /// Replaces the grid of `owner_key` with `raw`.
    ///
    /// Sections and rows lacking their nested-content key are skipped (and
    /// counted), as are elements that are not objects. Any database failure
    /// rolls the whole save back and leaves the previous tree in place.
    pub fn save_tree(&self, owner_key: &str, raw: &[Value]) -> StorageResult<SavedTree> {
        let mut conn = self.lock()?;
        let failed = |source| StorageError::TransactionFailed {
            owner_key: owner_key.to_string(),
            source,
        };

        let tx = conn.transaction().map_err(failed)?;
        match self.write_tree(&tx, owner_key, raw) {
            Ok(saved) => {
                tx.commit().map_err(failed)?;
                info!(
                    owner_key,
                    sections = saved.stats.sections,
                    rows = saved.stats.rows,
                    elements = saved.stats.elements,
                    skipped = saved.stats.skipped(),
                    "Grid saved"
                );
                Ok(saved)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(owner_key, error = %rollback, "Grid rollback failed");
                }
                warn!(owner_key, error = %e, "Grid save rolled back");
                Err(failed(e))
            }
        }
    }

    fn write_tree(&self, tx: &Transaction<'_>, owner_key: &str, raw: &[Value]) -> rusqlite::Result<SavedTree> {
        let now = Utc::now();
        let area = find_or_create_area(tx, owner_key, now)?;
        tx.execute(
            &format!("DELETE FROM {} WHERE area_id = ?1", TreeLevel::Section.table()),
            params![area.id.to_string()],
        )?;

        let sections = self.level(TreeLevel::Section);
        let rows = self.level(TreeLevel::Row);
        let mut stats = TreeStats::default();
        let mut section_order = 0u32;

        for (position, section_raw) in raw.iter().enumerate() {
            let Some(section_obj) = section_raw.as_object().filter(|_| sections.is_complete(section_raw)) else {
                warn!(owner_key, position, "Skipping section without rows");
                stats.skipped_sections += 1;
                continue;
            };
            let section_id = self.insert_container(
                tx,
                TreeLevel::Section,
                &area.id.to_string(),
                section_obj,
                section_order,
                now,
            )?;
            section_order += 1;
            stats.sections += 1;

            let mut row_order = 0u32;
            for (row_position, row_raw) in sections.children(section_raw).iter().enumerate() {
                let Some(row_obj) = row_raw.as_object().filter(|_| rows.is_complete(row_raw)) else {
                    warn!(owner_key, section = %section_id, position = row_position, "Skipping row without elements");
                    stats.skipped_rows += 1;
                    continue;
                };
                let row_id =
                    self.insert_container(tx, TreeLevel::Row, section_id.as_str(), row_obj, row_order, now)?;
                row_order += 1;
                stats.rows += 1;

                let mut element_order = 0u32;
                for (element_position, element_raw) in rows.children(row_raw).iter().enumerate() {
                    let Some(element_obj) = element_raw.as_object() else {
                        warn!(owner_key, row = %row_id, position = element_position, "Skipping non-object element");
                        stats.skipped_elements += 1;
                        continue;
                    };
                    self.insert_element(tx, &row_id, element_obj, element_order, now)?;
                    element_order += 1;
                    stats.elements += 1;
                }
            }
        }

        Ok(SavedTree { area, stats })
    }

    fn insert_container(
        &self,
        tx: &Transaction<'_>,
        level: TreeLevel,
        parent_id: &str,
        raw: &Fields,
        order: u32,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<NodeId> {
        let id = NodeId::from_value_or_generate(raw.get(ID_KEY));
        let fields = self.level(level).extract_with_defaults(raw);

        let mut columns = vec!["id".to_string(), level.parent_column().to_string(), "\"order\"".to_string()];
        let mut values = vec![
            SqlValue::Text(id.to_string()),
            SqlValue::Text(parent_id.to_string()),
            SqlValue::Integer(i64::from(order)),
        ];
        for column in self.schema.level_columns(level) {
            if let Some(value) = fields.get(&column.name) {
                columns.push(format!("\"{}\"", column.name));
                values.push(codec::to_sql(value, column.kind));
            }
        }
        insert_row(tx, level.table(), columns, values, now)?;
        Ok(id)
    }

    fn insert_element(
        &self,
        tx: &Transaction<'_>,
        row_id: &NodeId,
        raw: &Fields,
        order: u32,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<()> {
        let id = NodeId::from_value_or_generate(raw.get(ID_KEY));
        let element_type = raw
            .get(KIND_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.options.default_element_type.as_str());

        let mut columns = vec!["id".to_string(), "row_id".to_string(), "type".to_string(), "\"order\"".to_string()];
        let mut values = vec![
            SqlValue::Text(id.to_string()),
            SqlValue::Text(row_id.to_string()),
            SqlValue::Text(element_type.to_string()),
            SqlValue::Integer(i64::from(order)),
        ];

        match self.registry.resolve(element_type) {
            Some(descriptor) => {
                let own: HashSet<String> = descriptor.storage_columns().into_iter().map(|c| c.name).collect();
                for (name, value) in descriptor.project_for_storage(raw) {
                    if !own.contains(&name) {
                        warn!(element_type, column = %name, "Dropping value for column the type does not own");
                        continue;
                    }
                    match self.schema.element_kind(&name) {
                        Some(kind) => {
                            columns.push(format!("\"{name}\""));
                            values.push(codec::to_sql(&value, kind));
                        }
                        None => warn!(element_type, column = %name, "Dropping value for unprovisioned column"),
                    }
                }
            }
            None => debug!(element_id = %id, element_type, "Storing element of unregistered type without payload"),
        }

        insert_row(tx, ELEMENTS, columns, values, now)
    }

    // ── Load ─────────────────────────────────────────────────────

    /// Loads the grid of `owner_key` in the requested projection.
    /// An owner without a grid yields an empty list.
    pub fn load_tree(&self, owner_key: &str, projection: Projection) -> StorageResult<Vec<Value>> {
        let Some(tree) = self.load_entities(owner_key)? else {
            return Ok(Vec::new());
        };
        let projector = Projector {
            registry: &self.registry,
            sections: &self.options.sections,
            rows: &self.options.rows,
            projection,
        };
        Ok(projector.tree(&tree))
    }

    /// Loads the typed tree of `owner_key`, ordered by `order` at every level.
    ///
    /// Each level is fetched with a single query scoped to the area, so the
    /// number of round-trips does not grow with the tree.
    pub fn load_entities(&self, owner_key: &str) -> StorageResult<Option<GridTree>> {
        let conn = self.lock()?;
        let Some(area) = select_area(&conn, owner_key)? else {
            return Ok(None);
        };
        let area_key = area.id.to_string();

        let mut sections = self.select_sections(&conn, &area, &area_key)?;
        let mut rows_by_section = group_by(self.select_rows(&conn, &area_key)?, |r| r.section_id.clone());
        let mut elements_by_row = group_by(self.select_elements(&conn, &area_key)?, |e| e.row_id.clone());

        sections.sort_by_key(|s| s.order);
        let sections = sections
            .into_iter()
            .map(|section| {
                let mut rows = rows_by_section.remove(&section.id).unwrap_or_default();
                rows.sort_by_key(|r| r.order);
                let rows = rows
                    .into_iter()
                    .map(|row| {
                        let mut elements = elements_by_row.remove(&row.id).unwrap_or_default();
                        elements.sort_by_key(|e| e.order);
                        RowNode { row, elements }
                    })
                    .collect();
                SectionNode { section, rows }
            })
            .collect();

        Ok(Some(GridTree { area, sections }))
    }

    fn select_sections(&self, conn: &Connection, area: &Area, area_key: &str) -> StorageResult<Vec<Section>> {
        let columns = self.schema.level_columns(TreeLevel::Section);
        let sql = format!(
            "SELECT s.id, s.\"order\"{} FROM {} s WHERE s.area_id = ?1 ORDER BY s.rowid",
            schema::select_list("s", columns),
            TreeLevel::Section.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let sections = stmt
            .query_map(params![area_key], |row| {
                Ok(Section {
                    id: node_id(row, 0)?,
                    area_id: area.id,
                    order: row.get(1)?,
                    fields: read_columns(row, 2, columns, false)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sections)
    }

    fn select_rows(&self, conn: &Connection, area_key: &str) -> StorageResult<Vec<Row>> {
        let columns = self.schema.level_columns(TreeLevel::Row);
        let sql = format!(
            "SELECT r.id, r.section_id, r.\"order\"{} FROM {} r
             JOIN {} s ON r.section_id = s.id
             WHERE s.area_id = ?1 ORDER BY r.rowid",
            schema::select_list("r", columns),
            TreeLevel::Row.table(),
            TreeLevel::Section.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![area_key], |row| {
                Ok(Row {
                    id: node_id(row, 0)?,
                    section_id: node_id(row, 1)?,
                    order: row.get(2)?,
                    fields: read_columns(row, 3, columns, false)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn select_elements(&self, conn: &Connection, area_key: &str) -> StorageResult<Vec<Element>> {
        let columns = self.schema.element_columns();
        let sql = format!(
            "SELECT e.id, e.row_id, e.type, e.\"order\"{} FROM {ELEMENTS} e
             JOIN {} r ON e.row_id = r.id
             JOIN {} s ON r.section_id = s.id
             WHERE s.area_id = ?1 ORDER BY e.rowid",
            schema::select_list("e", columns),
            TreeLevel::Row.table(),
            TreeLevel::Section.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let elements = stmt
            .query_map(params![area_key], |row| {
                Ok(Element {
                    id: node_id(row, 0)?,
                    row_id: node_id(row, 1)?,
                    element_type: row.get(2)?,
                    order: row.get(3)?,
                    values: read_columns(row, 4, columns, true)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(elements)
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Looks up the area of `owner_key`.
    pub fn area(&self, owner_key: &str) -> StorageResult<Option<Area>> {
        let conn = self.lock()?;
        Ok(select_area(&conn, owner_key)?)
    }

    /// Whether `owner_key` already has a normalized grid.
    pub fn has_area(&self, owner_key: &str) -> StorageResult<bool> {
        Ok(self.area(owner_key)?.is_some())
    }

    /// Rows held by the area of `owner_key`, zero throughout when it has none.
    pub fn counts(&self, owner_key: &str) -> StorageResult<TableCounts> {
        let conn = self.lock()?;
        let Some(area) = select_area(&conn, owner_key)? else {
            return Ok(TableCounts::default());
        };
        let sections = TreeLevel::Section.table();
        let rows = TreeLevel::Row.table();
        let sql = format!(
            "SELECT
                (SELECT COUNT(*) FROM {sections} s WHERE s.area_id = ?1),
                (SELECT COUNT(*) FROM {rows} r JOIN {sections} s ON r.section_id = s.id WHERE s.area_id = ?1),
                (SELECT COUNT(*) FROM {ELEMENTS} e JOIN {rows} r ON e.row_id = r.id
                    JOIN {sections} s ON r.section_id = s.id WHERE s.area_id = ?1)"
        );
        let (sections, rows, elements) = conn.query_row(&sql, params![area.id.to_string()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;
        Ok(TableCounts {
            areas: 1,
            sections: usize::try_from(sections).unwrap_or_default(),
            rows: usize::try_from(rows).unwrap_or_default(),
            elements: usize::try_from(elements).unwrap_or_default(),
        })
    }

    /// Total rows in each grid table.
    pub fn table_counts(&self) -> StorageResult<TableCounts> {
        let conn = self.lock()?;
        let count = |table: &str| -> rusqlite::Result<usize> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get::<_, i64>(0))
                .map(|n| usize::try_from(n).unwrap_or_default())
        };
        Ok(TableCounts {
            areas: count(AREAS)?,
            sections: count(TreeLevel::Section.table())?,
            rows: count(TreeLevel::Row.table())?,
            elements: count(ELEMENTS)?,
        })
    }
}

fn find_or_create_area(tx: &Transaction<'_>, owner_key: &str, now: DateTime<Utc>) -> rusqlite::Result<Area> {
    if let Some(mut area) = select_area(tx, owner_key)? {
        tx.execute(
            &format!("UPDATE {AREAS} SET updated_at = ?1 WHERE id = ?2"),
            params![now, area.id.to_string()],
        )?;
        area.updated_at = now;
        return Ok(area);
    }
    let area = Area {
        id: AreaId::new(),
        owner_key: owner_key.to_string(),
        created_at: now,
        updated_at: now,
    };
    tx.execute(
        &format!("INSERT INTO {AREAS} (id, owner_key, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)"),
        params![area.id.to_string(), area.owner_key, area.created_at, area.updated_at],
    )?;
    debug!(owner_key, area_id = %area.id, "Grid area created");
    Ok(area)
}

fn select_area(conn: &Connection, owner_key: &str) -> rusqlite::Result<Option<Area>> {
    conn.query_row(
        &format!("SELECT id, owner_key, created_at, updated_at FROM {AREAS} WHERE owner_key = ?1"),
        params![owner_key],
        |row| {
            let id: String = row.get(0)?;
            Ok(Area {
                id: AreaId::parse(&id).map_err(|e| conversion_error(0, e))?,
                owner_key: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
            })
        },
    )
    .optional()
}

fn insert_row(
    tx: &Transaction<'_>,
    table: &str,
    mut columns: Vec<String>,
    values: Vec<SqlValue>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    columns.extend(["created_at".to_string(), "updated_at".to_string()]);
    // Timestamps are bound through chrono's `ToSql`, like the area row.
    let mut params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    params.extend([&now as &dyn ToSql, &now as &dyn ToSql]);
    let placeholders = (1..=params.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
    let sql = format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", "));
    tx.execute(&sql, params.as_slice())?;
    Ok(())
}

fn read_columns(
    row: &rusqlite::Row<'_>,
    offset: usize,
    columns: &[ColumnDef],
    skip_nulls: bool,
) -> rusqlite::Result<Fields> {
    let mut fields = Fields::new();
    for (i, column) in columns.iter().enumerate() {
        let value = codec::from_sql(row.get_ref(offset + i)?, column.kind);
        if skip_nulls && value.is_null() {
            continue;
        }
        fields.insert(column.name.clone(), value);
    }
    Ok(fields)
}

fn node_id(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NodeId> {
    let raw: String = row.get(idx)?;
    NodeId::new(raw).map_err(|e| conversion_error(idx, e))
}

fn conversion_error(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> NodeId) -> HashMap<NodeId, Vec<T>> {
    let mut groups: HashMap<NodeId, Vec<T>> = HashMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}
