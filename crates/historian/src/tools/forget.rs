use std::path::Path;

use anyhow::Result;
use historian_core::HistorianError;
use historian_memory::{is_within_memory_root, resolve_record_path};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::args::{ParamKind, ParamSpec, ToolArgs, ToolSpec};
use crate::context::{ToolContext, is_file};

pub const SPEC: ToolSpec = ToolSpec {
    name: "memory_forget",
    description: "Delete memory records by exact path. Obtain paths from memory_recall first and confirm with the user before calling.",
    params: &[ParamSpec {
        name: "recordPaths",
        kind: ParamKind::StringList,
        description: "One path or a list of paths returned by memory_recall",
    }],
};

#[derive(Debug, Clone)]
pub struct ForgetParams {
    pub record_paths: Vec<String>,
}

impl ForgetParams {
    pub fn from_args(args: &Value) -> Result<Self, HistorianError> {
        let args = ToolArgs::new(args)?;
        Ok(Self {
            record_paths: args.string_list("recordPaths")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgetFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetOutput {
    pub success: bool,
    pub deleted: Vec<String>,
    pub deleted_count: usize,
    pub errors: Vec<ForgetFailure>,
}

pub async fn run(ctx: &ToolContext, params: ForgetParams) -> Result<ForgetOutput> {
    if params.record_paths.is_empty() {
        return Err(HistorianError::Validation("recordPaths must not be empty".to_string()).into());
    }
    let index_name = ctx.index_name()?;

    let mut deleted = Vec::new();
    let mut errors = Vec::new();
    for reference in &params.record_paths {
        match delete_one(ctx, reference).await {
            Ok(shown) => {
                info!(path = %shown, "Memory forgotten");
                deleted.push(shown);
            }
            Err(e) => {
                warn!(path = %reference, "Forget skipped: {e:#}");
                errors.push(ForgetFailure {
                    path: reference.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    ctx.refresh_quietly(&index_name).await;
    Ok(ForgetOutput {
        success: errors.is_empty(),
        deleted_count: deleted.len(),
        deleted,
        errors,
    })
}

async fn delete_one(ctx: &ToolContext, reference: &str) -> Result<String> {
    let path = resolve_record_path(reference, &ctx.project_root);
    if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
        return Err(HistorianError::Validation(format!("not a memory record: {reference}")).into());
    }
    if !is_within_memory_root(&path, &ctx.project_root) {
        return Err(HistorianError::OutOfScope(path.display().to_string()).into());
    }
    if !is_file(&path).await {
        return Err(HistorianError::RecordNotFound(reference.to_string()).into());
    }

    tokio::fs::remove_file(&path).await?;
    verify_removed(&path).await?;
    Ok(ctx.display_path(&path))
}

async fn verify_removed(path: &Path) -> Result<(), HistorianError> {
    if tokio::fs::try_exists(path).await.unwrap_or(true) {
        return Err(HistorianError::Verification {
            path: path.display().to_string(),
            reason: "file still exists after delete".to_string(),
        });
    }
    Ok(())
}
