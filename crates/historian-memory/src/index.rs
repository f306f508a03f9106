use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use historian_core::SearchMode;
use serde::{Deserialize, Serialize};

/// Parameters for one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Per-project index name.
    pub index: String,
    /// Restrict hits to one collection (memory type).
    pub collection: Option<String>,
    pub limit: usize,
    pub mode: SearchMode,
}

/// One normalized hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docid: Option<String>,
}

impl SearchResult {
    pub fn new(path: impl Into<String>, score: f64) -> Self {
        Self {
            path: path.into(),
            score,
            title: None,
            snippet: None,
            content: None,
            docid: None,
        }
    }
}

/// Search index over memory records.
///
/// Search and bulk fetch never fail: problems are logged and yield no hits.
/// Maintenance calls return errors so callers can decide how loudly to report.
#[async_trait]
pub trait MemoryIndex: Send + Sync {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult>;

    /// Register `dir` as collection `name` unless a collection with that name exists.
    async fn add_to_collection(&self, dir: &Path, name: &str, index: &str) -> Result<()>;

    /// Register an auxiliary directory under `collection` without the
    /// existence check, so several directories can share one collection.
    async fn add_external_path(&self, dir: &Path, collection: &str, index: &str) -> Result<()>;

    async fn refresh_index(&self, index: &str) -> Result<()>;

    async fn refresh_embeddings(&self, index: &str) -> Result<()>;

    async fn list_collections(&self, index: &str) -> Result<Vec<String>>;

    async fn get_all_in_collection(&self, collection: &str, index: &str) -> Vec<SearchResult>;
}
