//! CLI front-ends for the memory tools. Each handler builds typed params,
//! runs the same tool code the MCP server uses, and renders the output.
//! Handlers return `false` when the operation reported a failure.

use std::fmt::Write as _;

use anyhow::Result;
use historian_core::{HistorianError, OutputFormat, SearchMode};
use serde::Serialize;

use crate::context::ToolContext;
use crate::tools::forget::{ForgetOutput, ForgetParams};
use crate::tools::list_types::ListTypesOutput;
use crate::tools::recall::{RecallOutput, RecallParams};
use crate::tools::remember::{RememberOutput, RememberParams};
use crate::tools::sync::SyncOutput;
use crate::tools::{forget, list_types, recall, remember, sync};

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", text(value)),
    }
    Ok(())
}

pub(crate) async fn handle_remember(
    ctx: &ToolContext,
    params: RememberParams,
    format: OutputFormat,
) -> Result<bool> {
    let output = remember::run(ctx, params).await?;
    emit(format, &output, render_remember)?;
    Ok(output.success)
}

pub(crate) struct RecallArgs {
    pub query: Option<String>,
    pub memory_type: Option<String>,
    pub limit: Option<u64>,
    pub mode: Option<SearchMode>,
    pub fetch_all: bool,
}

pub(crate) async fn handle_recall(
    ctx: &ToolContext,
    args: RecallArgs,
    format: OutputFormat,
) -> Result<bool> {
    let limit = match args.limit {
        Some(0) => {
            return Err(HistorianError::Validation("limit must be a positive integer".into()).into());
        }
        Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        None => None,
    };
    let params = RecallParams {
        query: args.query,
        memory_type: args.memory_type,
        limit,
        mode: args.mode.unwrap_or_default(),
        fetch_all: args.fetch_all,
    };
    let output = recall::run(ctx, params).await?;
    emit(format, &output, render_recall)?;
    Ok(true)
}

pub(crate) async fn handle_forget(
    ctx: &ToolContext,
    paths: Vec<String>,
    format: OutputFormat,
) -> Result<bool> {
    let output = forget::run(ctx, ForgetParams { record_paths: paths }).await?;
    emit(format, &output, render_forget)?;
    Ok(output.success)
}

pub(crate) fn handle_list_types(ctx: &ToolContext, format: OutputFormat) -> Result<bool> {
    let output = list_types::run(ctx);
    emit(format, &output, render_list_types)?;
    Ok(true)
}

pub(crate) async fn handle_sync(ctx: &ToolContext, format: OutputFormat) -> Result<bool> {
    let output = sync::run(ctx).await;
    emit(format, &output, render_sync)?;
    Ok(output.success)
}

fn render_remember(out: &RememberOutput) -> String {
    let verb = if out.updated { "Updated" } else { "Saved" };
    let mut text = format!("{verb} {} [{}]\n", out.file_path, out.memory_type);
    let _ = writeln!(text, "  id:       {}", out.id);
    let _ = writeln!(text, "  modified: {}", out.modified);
    if !out.tags.is_empty() {
        let _ = writeln!(text, "  tags:     {}", out.tags.join(", "));
    }
    text
}

fn render_recall(out: &RecallOutput) -> String {
    let mut text = String::new();
    if let Some(message) = &out.message {
        let _ = writeln!(text, "{message}");
        return text;
    }
    for record in &out.records {
        let _ = writeln!(
            text,
            "{}  [{}]  {:.2}",
            record.path, record.memory_type, record.score
        );
        let _ = writeln!(text, "  {}", record.title);
        if let Some(first) = record.content.lines().find(|l| !l.trim().is_empty()) {
            let _ = writeln!(text, "  {}", first.trim());
        }
    }
    let _ = writeln!(text, "{} record(s)", out.count);
    text
}

fn render_forget(out: &ForgetOutput) -> String {
    let mut text = String::new();
    for path in &out.deleted {
        let _ = writeln!(text, "Deleted {path}");
    }
    for failure in &out.errors {
        let _ = writeln!(text, "Skipped {}: {}", failure.path, failure.error);
    }
    let _ = writeln!(text, "{} record(s) deleted", out.deleted_count);
    text
}

fn render_list_types(out: &ListTypesOutput) -> String {
    let mut text = String::new();
    for entry in &out.types {
        let marker = if entry.name == out.fallback_type {
            " (fallback)"
        } else if !entry.builtin {
            " (custom)"
        } else {
            ""
        };
        let _ = writeln!(text, "{:<24} {}{marker}", entry.name, entry.description);
    }
    text
}

fn render_sync(out: &SyncOutput) -> String {
    match (&out.message, &out.error) {
        (_, Some(error)) => format!("Sync failed: {error}\n"),
        (Some(message), None) => format!("{message}\n"),
        (None, None) => String::new(),
    }
}
