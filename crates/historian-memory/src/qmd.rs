//! Adapter for the `qmd` command-line indexer.
//!
//! Every invocation is `qmd --index <name> <subcommand> ...`. Argument vectors
//! come from the pure `build_*` functions and raw output goes through the
//! `parse_*` functions, so both halves are testable without the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use historian_core::SearchMode;
use historian_process::{ExecutionResult, run_with_timeout};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::index::{MemoryIndex, SearchOptions, SearchResult};

/// File mask applied to every memory collection.
pub const RECORD_MASK: &str = "**/*.md";

/// Marker preceding the collection URI in `collection list` text output.
const LIST_URI_MARKER: &str = "(qmd://";

#[derive(Debug, Clone)]
pub struct QmdIndex {
    binary: String,
    timeout: Duration,
}

impl QmdIndex {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[String]) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        debug!(binary = %self.binary, ?args, "Running indexer");
        let result = run_with_timeout(cmd, self.timeout)
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;
        if !result.success() {
            bail!(
                "{} {} failed ({})",
                self.binary,
                args.get(2).map(String::as_str).unwrap_or_default(),
                result.failure_reason()
            );
        }
        Ok(result)
    }
}

fn with_index(index: &str, rest: &[&str]) -> Vec<String> {
    let mut args = vec!["--index".to_string(), index.to_string()];
    args.extend(rest.iter().map(|arg| arg.to_string()));
    args
}

/// Indexer subcommand implementing a search mode.
pub fn search_subcommand(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::ExactKeyword => "search",
        SearchMode::SemanticVector => "vsearch",
        SearchMode::HybridDeep => "query",
    }
}

/// Options come first and the query follows `--`, so a query starting with
/// `-` is never read as a flag.
pub fn build_search_args(query: &str, options: &SearchOptions) -> Vec<String> {
    let limit = options.limit.to_string();
    let mut args = with_index(
        &options.index,
        &[search_subcommand(options.mode), "-n", &limit, "--json"],
    );
    if let Some(collection) = options.collection.as_deref().filter(|c| !c.is_empty()) {
        args.push("-c".to_string());
        args.push(collection.to_string());
    }
    args.push("--".to_string());
    args.push(query.to_string());
    args
}

pub fn build_collection_add_args(dir: &Path, name: &str, index: &str) -> Vec<String> {
    let dir = dir.to_string_lossy();
    with_index(
        index,
        &["collection", "add", &dir, "--name", name, "--mask", RECORD_MASK],
    )
}

/// External paths are added without a mask so any document type is indexed.
pub fn build_external_add_args(dir: &Path, collection: &str, index: &str) -> Vec<String> {
    let dir = dir.to_string_lossy();
    with_index(index, &["collection", "add", &dir, "--name", collection])
}

pub fn build_collection_list_args(index: &str) -> Vec<String> {
    with_index(index, &["collection", "list"])
}

pub fn build_update_args(index: &str) -> Vec<String> {
    with_index(index, &["update"])
}

pub fn build_embed_args(index: &str) -> Vec<String> {
    with_index(index, &["embed"])
}

pub fn build_multi_get_args(collection: &str, index: &str) -> Vec<String> {
    let pattern = format!("{collection}/{RECORD_MASK}");
    with_index(index, &["multi-get", &pattern, "--json"])
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Map one raw hit onto [`SearchResult`]. Hits without a path are dropped.
pub fn normalize_result(raw: &Value) -> Option<SearchResult> {
    let obj = raw.as_object()?;
    let path = string_field(obj, &["file", "path", "filepath"])?;
    let score = obj.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let content = string_field(obj, &["content", "body"]);
    let snippet = string_field(obj, &["snippet"]).or_else(|| content.clone());
    let docid = obj.get("docid").and_then(|id| match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    Some(SearchResult {
        path,
        score,
        title: string_field(obj, &["title"]),
        snippet,
        content,
        docid,
    })
}

/// Parse search or multi-get output.
///
/// JSON arrays (or `{"results": [...]}`) are normalized hit by hit. Non-JSON
/// output is read line by line, keeping lines whose first token is a `.md`
/// path or an index URI.
pub fn parse_search_output(stdout: &str) -> Result<Vec<SearchResult>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => Ok(items.iter().filter_map(normalize_result).collect()),
        Ok(Value::Object(obj)) => match obj.get("results") {
            Some(Value::Array(items)) => Ok(items.iter().filter_map(normalize_result).collect()),
            _ => bail!("unexpected JSON object in indexer output"),
        },
        Ok(_) => bail!("unexpected JSON value in indexer output"),
        Err(_) => Ok(trimmed
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter(|token| token.ends_with(".md") || token.starts_with("qmd://"))
            .map(|token| SearchResult::new(token, 0.0))
            .collect()),
    }
}

/// Parse `collection list` output, JSON or text.
pub fn parse_collection_list(stdout: &str) -> Vec<String> {
    let trimmed = stdout.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let items: &[Value] = match &value {
            Value::Array(items) => items.as_slice(),
            Value::Object(obj) => obj
                .get("collections")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        };
        return items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => string_field(obj, &["name"]),
                _ => None,
            })
            .collect();
    }

    trimmed
        .lines()
        .filter_map(|line| {
            let (before, _) = line.split_once(LIST_URI_MARKER)?;
            before.split_whitespace().last().map(str::to_string)
        })
        .collect()
}

#[async_trait]
impl MemoryIndex for QmdIndex {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let args = build_search_args(query, options);
        let output = match self.run(&args).await {
            Ok(result) => result.output,
            Err(e) => {
                warn!(mode = %options.mode, "Search failed: {e:#}");
                return Vec::new();
            }
        };
        parse_search_output(&output).unwrap_or_else(|e| {
            warn!(mode = %options.mode, "Unreadable search output: {e:#}");
            Vec::new()
        })
    }

    async fn add_to_collection(&self, dir: &Path, name: &str, index: &str) -> Result<()> {
        let existing = self.list_collections(index).await?;
        if existing.iter().any(|collection| collection == name) {
            debug!(collection = name, "Collection already registered");
            return Ok(());
        }
        self.run(&build_collection_add_args(dir, name, index)).await?;
        Ok(())
    }

    async fn add_external_path(&self, dir: &Path, collection: &str, index: &str) -> Result<()> {
        self.run(&build_external_add_args(dir, collection, index)).await?;
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> Result<()> {
        self.run(&build_update_args(index)).await?;
        Ok(())
    }

    async fn refresh_embeddings(&self, index: &str) -> Result<()> {
        self.run(&build_embed_args(index)).await?;
        Ok(())
    }

    async fn list_collections(&self, index: &str) -> Result<Vec<String>> {
        let result = self.run(&build_collection_list_args(index)).await?;
        Ok(parse_collection_list(&result.output))
    }

    async fn get_all_in_collection(&self, collection: &str, index: &str) -> Vec<SearchResult> {
        let output = match self.run(&build_multi_get_args(collection, index)).await {
            Ok(result) => result.output,
            Err(e) => {
                warn!(collection, "Bulk fetch failed: {e:#}");
                return Vec::new();
            }
        };
        parse_search_output(&output).unwrap_or_else(|e| {
            warn!(collection, "Unreadable bulk fetch output: {e:#}");
            Vec::new()
        })
    }
}

#[cfg(test)]
#[path = "qmd_tests.rs"]
mod tests;
