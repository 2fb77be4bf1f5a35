//! Staging area for trees submitted before their entry has an id.
//!
//! A new entry is processed before the content system assigns its id, so the
//! submitted tree is stashed under the entry's slug and picked up again once
//! the entry-saved hook runs with the real id. The buffer is an owned value
//! scoped to one logical request through [`EditContext`]; nothing survives the
//! request that created it.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Pending raw trees, keyed by entry id and, independently, by slug.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingEdits {
    by_id: HashMap<String, Vec<Value>>,
    by_key: HashMap<String, Vec<Value>>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `tree` for an entry id, replacing anything staged before.
    pub fn store(&mut self, id: impl Into<String>, tree: Vec<Value>) {
        self.by_id.insert(id.into(), tree);
    }

    /// Stages `tree` under a natural key such as a slug.
    pub fn store_by_key(&mut self, key: impl Into<String>, tree: Vec<Value>) {
        self.by_key.insert(key.into(), tree);
    }

    pub fn has(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn has_by_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Removes and returns the tree staged for `id`; empty when there is none.
    pub fn pull(&mut self, id: &str) -> Vec<Value> {
        self.by_id.remove(id).unwrap_or_default()
    }

    /// Removes and returns the tree staged under `key`; empty when there is none.
    pub fn pull_by_key(&mut self, key: &str) -> Vec<Value> {
        self.by_key.remove(key).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.by_key.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
    }
}

/// Per-request state threaded through field processing and the entry-saved
/// hook. Create one per request and [`finish`](Self::finish) it at the end.
#[derive(Debug, Default)]
pub struct EditContext {
    pending: PendingEdits,
}

impl EditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut PendingEdits {
        &mut self.pending
    }

    /// Ends the request. Trees that were staged but never claimed are
    /// discarded and returned as a count.
    pub fn finish(mut self) -> usize {
        let leftover = self.pending.len();
        if leftover > 0 {
            let keys: Vec<&str> = self
                .pending
                .by_id
                .keys()
                .chain(self.pending.by_key.keys())
                .map(String::as_str)
                .collect();
            warn!(leftover, keys = ?keys, "Discarding unclaimed pending grid data");
        } else {
            debug!("Edit context finished");
        }
        self.pending.clear();
        leftover
    }
}
