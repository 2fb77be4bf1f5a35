//! Table layout and provisioning.
//!
//! Four tables, each child cascading from its parent:
//! `grid_areas` ← `grid_sections` ← `grid_rows` ← `grid_elements`.
//! Level fields become columns on their level's table; every registered
//! element type's columns coexist in the wide `grid_elements` table.
//! Provisioning is idempotent and adds columns that appeared since the
//! tables were created.

use crate::codec;
use pagegrid_model::{ColumnDef, ColumnKind, ElementRegistry, LevelFields};
use pagegrid_types::TreeLevel;
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::info;

pub(crate) const AREAS: &str = "grid_areas";
pub(crate) const ELEMENTS: &str = "grid_elements";

/// Column layout derived from the level schemas and the element registry.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSchema {
    sections: Vec<ColumnDef>,
    rows: Vec<ColumnDef>,
    elements: Vec<ColumnDef>,
}

impl GridSchema {
    pub fn new(sections: &LevelFields, rows: &LevelFields, registry: &ElementRegistry) -> Self {
        Self {
            sections: sections.columns(),
            rows: rows.columns(),
            elements: registry.element_columns(),
        }
    }

    /// Custom columns of a container level.
    pub fn level_columns(&self, level: TreeLevel) -> &[ColumnDef] {
        match level {
            TreeLevel::Section => &self.sections,
            TreeLevel::Row => &self.rows,
        }
    }

    /// Type-specific columns of the element table.
    pub fn element_columns(&self) -> &[ColumnDef] {
        &self.elements
    }

    /// Storage class of an element column, if provisioned.
    pub fn element_kind(&self, column: &str) -> Option<ColumnKind> {
        self.elements.iter().find(|c| c.name == column).map(|c| c.kind)
    }

    /// DDL creating the tables and indexes.
    pub fn ddl(&self) -> Vec<String> {
        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {AREAS} (
    id TEXT PRIMARY KEY,
    owner_key TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"
        )];

        for (level, parent) in [(TreeLevel::Section, AREAS), (TreeLevel::Row, TreeLevel::Section.table())] {
            let table = level.table();
            let fk = level.parent_column();
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {table} (
    id TEXT PRIMARY KEY,
    {fk} TEXT NOT NULL REFERENCES {parent}(id) ON DELETE CASCADE,
    \"order\" INTEGER NOT NULL DEFAULT 0,{columns}
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)",
                columns = column_block(self.level_columns(level)),
            ));
            statements.push(format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_{fk}_order ON {table}({fk}, \"order\")"
            ));
        }

        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {ELEMENTS} (
    id TEXT PRIMARY KEY,
    row_id TEXT NOT NULL REFERENCES {rows}(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    \"order\" INTEGER NOT NULL DEFAULT 0,{columns}
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)",
            rows = TreeLevel::Row.table(),
            columns = column_block(&self.elements),
        ));
        statements.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{ELEMENTS}_row_id_order ON {ELEMENTS}(row_id, \"order\")"
        ));
        statements.push(format!("CREATE INDEX IF NOT EXISTS idx_{ELEMENTS}_type ON {ELEMENTS}(type)"));
        statements
    }

    /// Creates missing tables, indexes and columns.
    pub fn provision(&self, conn: &Connection) -> rusqlite::Result<()> {
        for statement in self.ddl() {
            conn.execute(&statement, [])?;
        }
        let tables = [
            (TreeLevel::Section.table(), &self.sections),
            (TreeLevel::Row.table(), &self.rows),
            (ELEMENTS, &self.elements),
        ];
        for (table, columns) in tables {
            let existing = existing_columns(conn, table)?;
            for column in columns.iter().filter(|c| !existing.contains(&c.name)) {
                info!(table, column = %column.name, "Adding grid column");
                conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {}", column_sql(column)), [])?;
            }
        }
        Ok(())
    }
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.kind.sql_type());
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&codec::sql_literal(default, column.kind));
    }
    sql
}

fn column_block(columns: &[ColumnDef]) -> String {
    columns
        .iter()
        .map(|c| format!("\n    {},", column_sql(c)))
        .collect()
}

fn existing_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    names.collect()
}

/// Quoted, comma-separated column names, each prefixed with `alias.`.
pub(crate) fn select_list(alias: &str, columns: &[ColumnDef]) -> String {
    columns
        .iter()
        .map(|c| format!(", {alias}.\"{}\"", c.name))
        .collect()
}
