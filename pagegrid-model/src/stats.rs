use crate::level::LevelFields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::AddAssign;

/// Node counts for a grid tree, plus the entries dropped as incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub sections: usize,
    pub rows: usize,
    pub elements: usize,
    pub skipped_sections: usize,
    pub skipped_rows: usize,
    pub skipped_elements: usize,
}

impl TreeStats {
    /// Counts what saving `raw` would create, applying the same skip rules.
    pub fn of_raw(raw: &[Value], sections: &LevelFields, rows: &LevelFields) -> Self {
        let mut stats = Self::default();
        for section in raw {
            if !sections.is_complete(section) {
                stats.skipped_sections += 1;
                continue;
            }
            stats.sections += 1;
            for row in sections.children(section) {
                if !rows.is_complete(row) {
                    stats.skipped_rows += 1;
                    continue;
                }
                stats.rows += 1;
                for element in rows.children(row) {
                    if element.is_object() {
                        stats.elements += 1;
                    } else {
                        stats.skipped_elements += 1;
                    }
                }
            }
        }
        stats
    }

    /// Total number of entries dropped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped_sections + self.skipped_rows + self.skipped_elements
    }
}

impl AddAssign for TreeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.sections += rhs.sections;
        self.rows += rhs.rows;
        self.elements += rhs.elements;
        self.skipped_sections += rhs.skipped_sections;
        self.skipped_rows += rhs.skipped_rows;
        self.skipped_elements += rhs.skipped_elements;
    }
}
