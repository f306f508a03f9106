use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use historian_core::{HistorianError, resolve_memory_type};
use historian_memory::{
    MemoryRecord, generate_filename, is_within_memory_root, resolve_record_path,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::args::{ParamKind, ParamSpec, ToolArgs, ToolSpec};
use crate::context::{ToolContext, is_dir, is_file};

pub const SPEC: ToolSpec = ToolSpec {
    name: "memory_remember",
    description: "Save a memory. Pass targetRecordRef (a path returned by memory_recall) to update that record in place instead of creating a new one.",
    params: &[
        ParamSpec {
            name: "title",
            kind: ParamKind::String,
            description: "Short human title; becomes the file name",
        },
        ParamSpec {
            name: "content",
            kind: ParamKind::String,
            description: "Memory body in markdown",
        },
        ParamSpec {
            name: "memoryType",
            kind: ParamKind::String,
            description: "Exact memory type name (see memory_list_types)",
        },
        ParamSpec {
            name: "tags",
            kind: ParamKind::OptionalStringList,
            description: "Tags; replaces existing tags on update",
        },
        ParamSpec {
            name: "targetRecordRef",
            kind: ParamKind::OptionalString,
            description: "Path of an existing record to update",
        },
    ],
};

#[derive(Debug, Clone)]
pub struct RememberParams {
    pub title: String,
    pub content: String,
    pub memory_type: String,
    pub tags: Option<Vec<String>>,
    pub target_record_ref: Option<String>,
}

impl RememberParams {
    pub fn from_args(args: &Value) -> Result<Self, HistorianError> {
        let args = ToolArgs::new(args)?;
        Ok(Self {
            title: args.string("title")?,
            content: args.string("content")?,
            memory_type: args.string("memoryType")?,
            tags: args.optional_string_list("tags")?,
            target_record_ref: args.optional_string("targetRecordRef")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RememberOutput {
    pub success: bool,
    pub file_path: String,
    pub id: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub created: String,
    pub modified: String,
    pub updated: bool,
}

pub async fn run(ctx: &ToolContext, params: RememberParams) -> Result<RememberOutput> {
    if params.content.trim().is_empty() {
        return Err(HistorianError::Validation("content cannot be empty".to_string()).into());
    }
    let memory_type = resolve_memory_type(&params.memory_type, &ctx.config.memory_types)?;
    let index_name = ctx.index_name()?;

    let (path, record, updated) = match params.target_record_ref.as_deref() {
        Some(reference) => {
            let (path, record) = update_existing(ctx, reference, &params, &memory_type).await?;
            (path, record, true)
        }
        None => {
            let (path, record) = create_new(ctx, &params, &memory_type).await?;
            (path, record, false)
        }
    };

    let type_dir = ctx.memory_root().join(&memory_type);
    if is_dir(&type_dir).await {
        if let Err(e) = ctx
            .index
            .add_to_collection(&type_dir, &memory_type, &index_name)
            .await
        {
            warn!(collection = %memory_type, "Collection registration failed: {e:#}");
        }
    }
    ctx.refresh_quietly(&index_name).await;

    info!(path = %path.display(), updated, "Memory saved");
    Ok(RememberOutput {
        success: true,
        file_path: ctx.display_path(&path),
        id: record.meta.id.clone(),
        memory_type: record.meta.memory_type.clone(),
        tags: record.meta.tags.clone().unwrap_or_default(),
        created: super::format_timestamp(&record.meta.created),
        modified: super::format_timestamp(&record.meta.modified),
        updated,
    })
}

fn normalized_tags(tags: &Option<Vec<String>>) -> Option<Vec<String>> {
    tags.as_ref().filter(|list| !list.is_empty()).cloned()
}

/// First free `<stem>.md`, `<stem>-2.md`, ... in `dir`.
async fn unique_record_path(dir: &Path, file_name: &str) -> PathBuf {
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    let mut candidate = dir.join(file_name);
    let mut n = 2u32;
    while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        candidate = dir.join(format!("{stem}-{n}.md"));
        n += 1;
    }
    candidate
}

/// Free record path for `file_name` under the type directory, scope-checked.
async fn record_slot(ctx: &ToolContext, memory_type: &str, file_name: &str) -> Result<PathBuf> {
    let type_dir = ctx.memory_root().join(memory_type);
    let path = unique_record_path(&type_dir, file_name).await;
    if !is_within_memory_root(&path, &ctx.project_root) {
        return Err(HistorianError::OutOfScope(path.display().to_string()).into());
    }
    Ok(path)
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

async fn verify_written(path: &Path, expected: &MemoryRecord) -> Result<()> {
    let written = MemoryRecord::load(path)
        .await
        .map_err(|e| HistorianError::Verification {
            path: path.display().to_string(),
            reason: format!("cannot re-read record: {e:#}"),
        })?;
    if written.content != expected.content {
        return Err(HistorianError::Verification {
            path: path.display().to_string(),
            reason: "content mismatch after write".to_string(),
        }
        .into());
    }
    Ok(())
}

async fn create_new(
    ctx: &ToolContext,
    params: &RememberParams,
    memory_type: &str,
) -> Result<(PathBuf, MemoryRecord)> {
    let file_name = generate_filename(&params.title)?;
    let path = record_slot(ctx, memory_type, &file_name).await?;
    ensure_parent(&path).await?;

    let record = MemoryRecord::create(
        params.content.clone(),
        memory_type,
        normalized_tags(&params.tags),
    );
    record.save(&path).await?;
    verify_written(&path, &record).await?;
    Ok((path, record))
}

/// Rewrite a record in place. A type change moves the file into the new
/// type's directory, keeping its file name unless that slot is taken.
async fn update_existing(
    ctx: &ToolContext,
    reference: &str,
    params: &RememberParams,
    memory_type: &str,
) -> Result<(PathBuf, MemoryRecord)> {
    let path = resolve_record_path(reference, &ctx.project_root);
    if !is_within_memory_root(&path, &ctx.project_root) {
        return Err(HistorianError::OutOfScope(path.display().to_string()).into());
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
        return Err(HistorianError::Validation(format!(
            "targetRecordRef must point to a .md record (got {reference})"
        ))
        .into());
    }
    if !is_file(&path).await {
        return Err(HistorianError::RecordNotFound(reference.to_string()).into());
    }

    let mut record = MemoryRecord::load(&path).await?;
    let retyped = record.meta.memory_type != memory_type;
    record.touch();
    record.content = params.content.clone();
    record.meta.memory_type = memory_type.to_string();
    if params.tags.is_some() {
        record.meta.tags = normalized_tags(&params.tags);
    }

    let target = if retyped {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("record path has no file name")?;
        let target = record_slot(ctx, memory_type, &file_name).await?;
        ensure_parent(&target).await?;
        target
    } else {
        path.clone()
    };

    record.save(&target).await?;
    verify_written(&target, &record).await?;
    if target != path {
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to remove {} after move", path.display()))?;
        info!(
            from = %ctx.display_path(&path),
            to = %ctx.display_path(&target),
            "Memory moved to new type"
        );
    }
    Ok((target, record))
}
