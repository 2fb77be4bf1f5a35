//! Tree levels and the keys the editor uses to describe them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key holding a node's identifier in edit-shaped data.
pub const ID_KEY: &str = "_id";

/// Key holding the kind tag ("section", "row") or the element type tag.
pub const KIND_KEY: &str = "type";

/// Editing-only flag; always `true` for persisted nodes.
pub const ENABLED_KEY: &str = "enabled";

/// The two container levels beneath an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeLevel {
    Section,
    Row,
}

impl TreeLevel {
    /// Kind tag written under [`KIND_KEY`].
    #[must_use]
    pub const fn kind_tag(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Row => "row",
        }
    }

    /// Key under which this level's children are nested.
    #[must_use]
    pub const fn children_key(self) -> &'static str {
        match self {
            Self::Section => "rows",
            Self::Row => "elements",
        }
    }

    /// Table holding this level's rows.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Section => "grid_sections",
            Self::Row => "grid_rows",
        }
    }

    /// Foreign-key column pointing at the parent.
    #[must_use]
    pub const fn parent_column(self) -> &'static str {
        match self {
            Self::Section => "area_id",
            Self::Row => "section_id",
        }
    }
}

impl fmt::Display for TreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_tag())
    }
}
