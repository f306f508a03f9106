use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::args::ToolSpec;
use crate::context::{ToolContext, is_dir};

pub const SPEC: ToolSpec = ToolSpec {
    name: "memory_sync",
    description: "Re-index memory files after they were edited outside the memory tools.",
    params: &[],
};

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Never fails; problems are reported in the output.
pub async fn run(ctx: &ToolContext) -> SyncOutput {
    match sync(ctx).await {
        Ok(registered) => SyncOutput {
            success: true,
            message: Some(format!(
                "Index and embeddings refreshed ({registered} collection(s) registered)"
            )),
            error: None,
        },
        Err(e) => {
            warn!("Sync failed: {e:#}");
            SyncOutput {
                success: false,
                message: None,
                error: Some(format!("{e:#}")),
            }
        }
    }
}

async fn sync(ctx: &ToolContext) -> Result<usize> {
    let index_name = ctx.index_name()?;
    let mut registered = 0;
    for (name, dir) in type_dirs(ctx).await? {
        if let Err(e) = ctx.index.add_to_collection(&dir, &name, &index_name).await {
            warn!(collection = %name, "Collection registration failed: {e:#}");
            continue;
        }
        registered += 1;
    }
    ctx.index
        .refresh_index(&index_name)
        .await
        .context("index update failed")?;
    ctx.index
        .refresh_embeddings(&index_name)
        .await
        .context("embedding update failed")?;
    info!(index = %index_name, registered, "Memory index synced");
    Ok(registered)
}

/// Existing `<memory root>/<type>` directories, sorted by name.
async fn type_dirs(ctx: &ToolContext) -> Result<Vec<(String, std::path::PathBuf)>> {
    let root = ctx.memory_root();
    if !is_dir(&root).await {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(&root)
        .await
        .with_context(|| format!("Failed to read {}", root.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            dirs.push((name.to_string(), entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}
