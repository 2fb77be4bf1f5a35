//! Asset references for element types that point at external media.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved asset, as inlined into rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub url: String,
    pub path: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Looks up assets by their stored reference.
pub trait AssetResolver: Send + Sync {
    /// Returns `None` when the asset no longer exists.
    fn find(&self, reference: &str) -> Option<Asset>;
}

/// Resolver for hosts without an asset store; nothing resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn find(&self, _reference: &str) -> Option<Asset> {
        None
    }
}

/// In-memory resolver keyed by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticAssets {
    assets: HashMap<String, Asset>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, asset: Asset) {
        self.assets.insert(reference.into(), asset);
    }

    /// Parses a `{"reference": {asset}}` JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for StaticAssets {
    fn find(&self, reference: &str) -> Option<Asset> {
        self.assets.get(reference).cloned()
    }
}
