use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::index::{MemoryIndex, SearchOptions, SearchResult};

/// Index that stores nothing. Used when the indexer binary is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndex;

#[async_trait]
impl MemoryIndex for NoopIndex {
    async fn search(&self, _query: &str, _options: &SearchOptions) -> Vec<SearchResult> {
        Vec::new()
    }

    async fn add_to_collection(&self, _dir: &Path, _name: &str, _index: &str) -> Result<()> {
        Ok(())
    }

    async fn add_external_path(&self, _dir: &Path, _collection: &str, _index: &str) -> Result<()> {
        Ok(())
    }

    async fn refresh_index(&self, _index: &str) -> Result<()> {
        Ok(())
    }

    async fn refresh_embeddings(&self, _index: &str) -> Result<()> {
        Ok(())
    }

    async fn list_collections(&self, _index: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn get_all_in_collection(&self, _collection: &str, _index: &str) -> Vec<SearchResult> {
        Vec::new()
    }
}
