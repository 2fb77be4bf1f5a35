//! The grid as a field type of the surrounding content system.
//!
//! The content system stores one value per field. For a grid that value is
//! only a marker naming the owning entry; the tree itself lives in the grid
//! tables and is swapped in on the way to the editor and to templates.

use crate::error::HostResult;
use crate::pending::EditContext;
use pagegrid_storage::{GridStore, SavedTree};
use pagegrid_types::Projection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key of the marker stored in place of the tree.
pub const ENTRY_MARKER_KEY: &str = "__entry_id";

/// The content-system entry a field value belongs to.
///
/// A new entry has a slug before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl EntryRef {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            slug: None,
        }
    }

    pub fn with_slug(slug: impl Into<String>) -> Self {
        Self {
            id: None,
            slug: Some(slug.into()),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }
}

/// Field-type adapter between the content system and a [`GridStore`].
#[derive(Clone)]
pub struct GridField {
    store: Arc<GridStore>,
}

impl GridField {
    pub fn new(store: Arc<GridStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    /// Handles a submitted tree and returns the value the content system
    /// should keep for the field.
    ///
    /// With an entry id the tree is saved at once and the marker is returned.
    /// Without one the tree is staged under the slug for
    /// [`on_entry_saved`](Self::on_entry_saved) and `null` is returned.
    pub fn process(&self, ctx: &mut EditContext, entry: &EntryRef, raw: Value) -> HostResult<Value> {
        let tree = into_tree(raw);
        if let Some(id) = entry.id() {
            self.store.save_tree(id, &tree)?;
            return Ok(json!({ ENTRY_MARKER_KEY: id }));
        }
        match entry.slug() {
            Some(slug) => {
                debug!(slug, sections = tree.len(), "Staging grid for unsaved entry");
                ctx.pending_mut().store_by_key(slug, tree);
            }
            None => warn!("Dropping grid for entry without id or slug"),
        }
        Ok(Value::Null)
    }

    /// Editor data for a field value. The marker's entry id wins over the
    /// entry's own id; with neither the editor starts empty.
    pub fn pre_process(&self, value: &Value, entry: &EntryRef) -> HostResult<Vec<Value>> {
        let marked = value.get(ENTRY_MARKER_KEY).and_then(Value::as_str).filter(|id| !id.is_empty());
        match marked.or_else(|| entry.id()) {
            Some(id) => Ok(self.store.load_tree(id, Projection::Edit)?),
            None => Ok(Vec::new()),
        }
    }

    /// Template data for an entry.
    pub fn augment(&self, entry: &EntryRef) -> HostResult<Vec<Value>> {
        match entry.id() {
            Some(id) => Ok(self.store.load_tree(id, Projection::Render)?),
            None => Ok(Vec::new()),
        }
    }

    /// Entry-saved hook: saves the tree staged for the entry, looked up by id
    /// first and by slug second. Returns `None` when nothing was staged.
    pub fn on_entry_saved(&self, ctx: &mut EditContext, entry: &EntryRef) -> HostResult<Option<SavedTree>> {
        let Some(id) = entry.id() else {
            debug!("Entry saved without id, nothing to persist");
            return Ok(None);
        };

        let pending = ctx.pending_mut();
        let tree = if pending.has(id) {
            debug!(entry_id = id, "Found pending grid by entry id");
            pending.pull(id)
        } else if let Some(slug) = entry.slug().filter(|slug| pending.has_by_key(slug)) {
            debug!(entry_id = id, slug, "Found pending grid by slug");
            pending.pull_by_key(slug)
        } else {
            debug!(entry_id = id, "No pending grid");
            return Ok(None);
        };

        info!(entry_id = id, sections = tree.len(), "Saving pending grid");
        Ok(Some(self.store.save_tree(id, &tree)?))
    }
}

/// A submitted field value as a list of raw sections.
fn into_tree(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            warn!(kind = json_kind(&other), "Grid value is not a list, treating it as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
