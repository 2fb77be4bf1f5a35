//! One-off move of embedded legacy trees into the grid tables.

use crate::error::{HostError, HostResult};
use pagegrid_model::TreeStats;
use pagegrid_storage::GridStore;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// A content item carrying its grid as an embedded document.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyItem {
    pub owner_key: String,
    pub title: Option<String>,
    pub tree: Vec<Value>,
}

impl LegacyItem {
    /// Reads one exported item: `{"id": ..., "title": ..., "<field_handle>": [...]}`.
    /// A missing or non-list tree reads as empty.
    pub fn from_value(index: usize, value: &Value, field_handle: &str) -> HostResult<Self> {
        let invalid = |reason: &str| HostError::InvalidLegacyItem {
            index,
            reason: reason.to_string(),
        };
        let object = value.as_object().ok_or_else(|| invalid("not an object"))?;
        let owner_key = match object.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(invalid("missing id")),
        };
        let title = object.get("title").and_then(Value::as_str).map(str::to_string);
        let tree = object
            .get(field_handle)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(Self { owner_key, title, tree })
    }

    /// Parses an exported JSON array of items.
    pub fn parse_all(json: &str, field_handle: &str) -> HostResult<Vec<Self>> {
        let items: Vec<Value> = serde_json::from_str(json)?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::from_value(index, item, field_handle))
            .collect()
    }

    fn label(&self) -> &str {
        self.title.as_deref().unwrap_or("untitled")
    }
}

/// What a migration did, or would do in a dry run, for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationPreview {
    pub owner_key: String,
    pub title: Option<String>,
    pub stats: TreeStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub migrated: usize,
    pub skipped: usize,
    pub previews: Vec<MigrationPreview>,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.dry_run { "would be migrated" } else { "migrated" };
        write!(
            f,
            "Migration complete. {} entries {action}, {} skipped.",
            self.migrated, self.skipped
        )
    }
}

/// Saves legacy trees through a [`GridStore`].
///
/// Items with an empty tree are ignored. Items whose owner already has a
/// grid are skipped unless `force` is set. Each item is saved in its own
/// transaction; a failing save stops the run with
/// [`HostError::MigrationAborted`], which carries the report of the items
/// migrated before it.
pub struct LegacyMigrator<'a> {
    store: &'a GridStore,
    dry_run: bool,
    force: bool,
}

impl<'a> LegacyMigrator<'a> {
    pub fn new(store: &'a GridStore) -> Self {
        Self {
            store,
            dry_run: false,
            force: false,
        }
    }

    /// Only compute what would be written.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Overwrite owners that already have a grid.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn run(&self, items: &[LegacyItem]) -> HostResult<MigrationReport> {
        info!(items = items.len(), dry_run = self.dry_run, force = self.force, "Starting grid migration");
        let mut report = MigrationReport {
            dry_run: self.dry_run,
            ..MigrationReport::default()
        };

        for item in items {
            if item.tree.is_empty() {
                debug!(owner_key = %item.owner_key, "No legacy grid");
                continue;
            }
            if !self.force && self.store.has_area(&item.owner_key)? {
                warn!(
                    owner_key = %item.owner_key,
                    title = item.label(),
                    "Skipping entry that already has grid data"
                );
                report.skipped += 1;
                continue;
            }

            let stats = if self.dry_run {
                let options = self.store.options();
                TreeStats::of_raw(&item.tree, &options.sections, &options.rows)
            } else {
                match self.store.save_tree(&item.owner_key, &item.tree) {
                    Ok(saved) => saved.stats,
                    Err(source) => {
                        warn!(owner_key = %item.owner_key, migrated = report.migrated, "Grid migration aborted");
                        return Err(HostError::MigrationAborted {
                            owner_key: item.owner_key.clone(),
                            report: Box::new(report),
                            source,
                        });
                    }
                }
            };
            info!(
                owner_key = %item.owner_key,
                title = item.label(),
                sections = stats.sections,
                rows = stats.rows,
                elements = stats.elements,
                "Processed entry"
            );
            report.previews.push(MigrationPreview {
                owner_key: item.owner_key.clone(),
                title: item.title.clone(),
                stats,
            });
            report.migrated += 1;
        }

        info!(migrated = report.migrated, skipped = report.skipped, "Grid migration finished");
        Ok(report)
    }
}
