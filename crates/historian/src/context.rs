use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use historian_config::PluginConfig;
use historian_core::{FALLBACK_MEMORY_TYPE, HistorianError};
use historian_memory::{MemoryIndex, NoopIndex, QmdIndex, derive_index_name, project_memory_root};
use historian_process::check_tool_installed;
use tracing::{debug, warn};

pub(crate) async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

pub(crate) async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Everything a memory tool needs. Built once at startup; tools hold no
/// state of their own.
#[derive(Clone)]
pub struct ToolContext {
    pub config: PluginConfig,
    pub project_root: PathBuf,
    pub index: Arc<dyn MemoryIndex>,
}

impl ToolContext {
    pub fn new(config: PluginConfig, project_root: PathBuf, index: Arc<dyn MemoryIndex>) -> Self {
        Self {
            config,
            project_root,
            index,
        }
    }

    /// Per-project index name derived from the root's folder name.
    pub fn index_name(&self) -> Result<String, HistorianError> {
        derive_index_name(&self.project_root.to_string_lossy())
    }

    pub fn memory_root(&self) -> PathBuf {
        project_memory_root(&self.project_root)
    }

    /// Path shown to callers: relative to the project root when possible.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Re-scan the index and re-embed. Failures are logged, never returned.
    pub async fn refresh_quietly(&self, index_name: &str) {
        if let Err(e) = self.index.refresh_index(index_name).await {
            warn!("Index refresh failed: {e:#}");
        }
        if let Err(e) = self.index.refresh_embeddings(index_name).await {
            warn!("Embedding refresh failed: {e:#}");
        }
    }

    /// Register configured `externalPaths` under the fallback collection and
    /// re-index. Best effort: every failure is a warning.
    pub async fn prewarm_external_paths(&self) {
        if self.config.external_paths.is_empty() {
            return;
        }
        let index_name = match self.index_name() {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping external paths: {e}");
                return;
            }
        };
        for raw in &self.config.external_paths {
            let path = self.project_root.join(raw.trim());
            if let Err(e) = self
                .index
                .add_external_path(&path, FALLBACK_MEMORY_TYPE, &index_name)
                .await
            {
                warn!(path = %path.display(), "External path registration failed: {e:#}");
            }
        }
        if let Err(e) = self.index.refresh_index(&index_name).await {
            warn!("Index refresh after external paths failed: {e:#}");
        }
        debug!(count = self.config.external_paths.len(), "External paths registered");
    }
}

/// Resolve `--project` (or CWD) to a canonical directory.
pub fn determine_project_root(explicit: Option<&str>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Project root does not exist: {}", root.display()))
}

/// `qmd` adapter when the configured binary is on PATH, otherwise an index
/// that stores nothing so the tools still work on the files alone.
pub fn select_index(config: &PluginConfig) -> Arc<dyn MemoryIndex> {
    match check_tool_installed(&config.index_binary) {
        Ok(path) => {
            debug!(binary = %path.display(), "Using indexer");
            Arc::new(QmdIndex::new(
                config.index_binary.clone(),
                config.index_timeout(),
            ))
        }
        Err(e) => {
            warn!("{e:#}; search is disabled until the indexer is installed");
            Arc::new(NoopIndex)
        }
    }
}
