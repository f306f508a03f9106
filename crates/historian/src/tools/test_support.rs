//! In-memory index double for tool tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use historian_config::PluginConfig;
use historian_memory::{MemoryIndex, SearchOptions, SearchResult};
use tempfile::TempDir;

use crate::context::ToolContext;

#[derive(Default)]
pub struct FakeIndex {
    pub calls: Mutex<Vec<String>>,
    pub search_results: Mutex<Vec<SearchResult>>,
    pub collections: Mutex<Vec<String>>,
    pub documents: Mutex<Vec<(String, SearchResult)>>,
    pub fail_refresh: bool,
    pub fail_list: bool,
}

impl FakeIndex {
    pub fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_search_results(&self, results: Vec<SearchResult>) {
        *self.search_results.lock().unwrap() = results;
    }

    pub fn add_document(&self, collection: &str, result: SearchResult) {
        self.documents
            .lock()
            .unwrap()
            .push((collection.to_string(), result));
    }
}

#[async_trait]
impl MemoryIndex for FakeIndex {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        self.record(format!(
            "search {} {} {:?} {}",
            options.mode, query, options.collection, options.limit
        ));
        self.search_results.lock().unwrap().clone()
    }

    async fn add_to_collection(&self, dir: &Path, name: &str, index: &str) -> Result<()> {
        self.record(format!("add {} {} {}", dir.display(), name, index));
        let mut collections = self.collections.lock().unwrap();
        if !collections.iter().any(|c| c == name) {
            collections.push(name.to_string());
        }
        Ok(())
    }

    async fn add_external_path(&self, dir: &Path, collection: &str, index: &str) -> Result<()> {
        self.record(format!("external {} {} {}", dir.display(), collection, index));
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> Result<()> {
        self.record(format!("update {index}"));
        if self.fail_refresh {
            bail!("update failed");
        }
        Ok(())
    }

    async fn refresh_embeddings(&self, index: &str) -> Result<()> {
        self.record(format!("embed {index}"));
        if self.fail_refresh {
            bail!("embed failed");
        }
        Ok(())
    }

    async fn list_collections(&self, index: &str) -> Result<Vec<String>> {
        self.record(format!("list {index}"));
        if self.fail_list {
            bail!("list failed");
        }
        Ok(self.collections.lock().unwrap().clone())
    }

    async fn get_all_in_collection(&self, collection: &str, index: &str) -> Vec<SearchResult> {
        self.record(format!("multi-get {collection} {index}"));
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}

/// Temporary project named `my-project` wired to a [`FakeIndex`].
pub struct Fixture {
    _tmp: TempDir,
    pub root: PathBuf,
    pub index: Arc<FakeIndex>,
    pub ctx: ToolContext,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(PluginConfig::default(), FakeIndex::default())
    }

    pub fn with(config: PluginConfig, index: FakeIndex) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("my-project");
        std::fs::create_dir_all(&root).unwrap();
        let index = Arc::new(index);
        let ctx = ToolContext::new(config, root.clone(), index.clone());
        Self {
            _tmp: tmp,
            root,
            index,
            ctx,
        }
    }
}
