use crate::Fields;
use chrono::{DateTime, Utc};
use pagegrid_types::{AreaId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root of a normalized grid; one per owning content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    /// External identifier of the owning content item. Unique.
    pub owner_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: NodeId,
    pub area_id: AreaId,
    pub order: u32,
    /// Declared custom field values.
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: NodeId,
    pub section_id: NodeId,
    pub order: u32,
    pub fields: Fields,
}

/// A persisted element row.
///
/// `values` holds only the non-null type-specific columns; columns owned by
/// other element types are never present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: NodeId,
    pub row_id: NodeId,
    pub element_type: String,
    pub order: u32,
    pub values: Fields,
}

impl Element {
    /// Looks up a stored column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Extracts a string column.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }
}

/// An area with its complete, ordered subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTree {
    pub area: Area,
    pub sections: Vec<SectionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub section: Section,
    pub rows: Vec<RowNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    pub row: Row,
    pub elements: Vec<Element>,
}

impl GridTree {
    /// Number of sections, rows and elements in the tree.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        let rows = self.sections.iter().map(|s| s.rows.len()).sum();
        let elements = self
            .sections
            .iter()
            .flat_map(|s| &s.rows)
            .map(|r| r.elements.len())
            .sum();
        (self.sections.len(), rows, elements)
    }
}
