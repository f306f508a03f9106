use anyhow::Result;
use historian_core::{HistorianError, SearchMode, to_kebab_case};
use historian_memory::{MemoryRecord, SearchOptions, SearchResult, display_title, resolve_record_path};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::args::{ParamKind, ParamSpec, ToolArgs, ToolSpec};
use crate::context::ToolContext;

pub const DEFAULT_LIMIT: usize = 10;

pub const SPEC: ToolSpec = ToolSpec {
    name: "memory_recall",
    description: "Search saved memories. Returns full records with the path needed by memory_remember (targetRecordRef) and memory_forget.",
    params: &[
        ParamSpec {
            name: "query",
            kind: ParamKind::OptionalString,
            description: "What to look for; required unless fetchAll is true",
        },
        ParamSpec {
            name: "memoryType",
            kind: ParamKind::OptionalString,
            description: "Restrict to one memory type",
        },
        ParamSpec {
            name: "limit",
            kind: ParamKind::OptionalInteger,
            description: "Maximum number of search results (default 10)",
        },
        ParamSpec {
            name: "mode",
            kind: ParamKind::OptionalString,
            description: "exact-keyword, semantic-vector (default) or hybrid-deep",
        },
        ParamSpec {
            name: "fetchAll",
            kind: ParamKind::OptionalBoolean,
            description: "Return every record (of memoryType, if given) instead of searching",
        },
    ],
};

#[derive(Debug, Clone, Default)]
pub struct RecallParams {
    pub query: Option<String>,
    pub memory_type: Option<String>,
    pub limit: Option<usize>,
    pub mode: SearchMode,
    pub fetch_all: bool,
}

impl RecallParams {
    pub fn from_args(args: &Value) -> Result<Self, HistorianError> {
        let args = ToolArgs::new(args)?;
        let mode = match args.optional_string("mode")? {
            Some(raw) => SearchMode::parse(&raw).ok_or_else(|| {
                HistorianError::Validation(format!(
                    "mode must be exact-keyword, semantic-vector or hybrid-deep (got {raw})"
                ))
            })?,
            None => SearchMode::default(),
        };
        Ok(Self {
            query: args.optional_string("query")?,
            memory_type: args.optional_string("memoryType")?,
            limit: args
                .optional_integer("limit")?
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
            mode,
            fetch_all: args.optional_bool("fetchAll")?.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalledRecord {
    pub path: String,
    pub score: f64,
    pub title: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub created: String,
    pub modified: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecallOutput {
    pub records: Vec<RecalledRecord>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn run(ctx: &ToolContext, params: RecallParams) -> Result<RecallOutput> {
    let index_name = ctx.index_name()?;
    let collection = params
        .memory_type
        .as_deref()
        .map(to_kebab_case)
        .filter(|name| !name.is_empty());

    let hits = if params.fetch_all {
        fetch_all(ctx, collection.as_deref(), &index_name).await
    } else {
        let query = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                HistorianError::Validation("query is required unless fetchAll is true".to_string())
            })?;
        let options = SearchOptions {
            index: index_name.clone(),
            collection: collection.clone(),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
            mode: params.mode,
        };
        ctx.index.search(query, &options).await
    };

    let mut records = Vec::with_capacity(hits.len());
    for hit in hits.into_iter().filter(|hit| hit.path.ends_with(".md")) {
        if let Some(record) = load_record(ctx, hit).await {
            records.push(record);
        }
    }

    let message = records.is_empty().then(|| match (&params.query, params.fetch_all) {
        (_, true) => "No memories stored yet for this scope.".to_string(),
        (Some(query), false) => format!(
            "No memories matched \"{}\". Try another mode or broader terms.",
            query.trim()
        ),
        (None, false) => "No memories matched.".to_string(),
    });
    Ok(RecallOutput {
        count: records.len(),
        records,
        message,
    })
}

async fn fetch_all(
    ctx: &ToolContext,
    collection: Option<&str>,
    index_name: &str,
) -> Vec<SearchResult> {
    if let Some(collection) = collection {
        return ctx.index.get_all_in_collection(collection, index_name).await;
    }
    let collections = match ctx.index.list_collections(index_name).await {
        Ok(collections) => collections,
        Err(e) => {
            warn!("Listing collections failed: {e:#}");
            return Vec::new();
        }
    };
    let mut hits = Vec::new();
    for collection in &collections {
        hits.extend(ctx.index.get_all_in_collection(collection, index_name).await);
    }
    hits
}

async fn load_record(ctx: &ToolContext, hit: SearchResult) -> Option<RecalledRecord> {
    let path = resolve_record_path(&hit.path, &ctx.project_root);
    let record = match MemoryRecord::load(&path).await {
        Ok(record) => record,
        Err(e) => {
            warn!(path = %path.display(), "Skipping unreadable record: {e:#}");
            return None;
        }
    };
    debug!(path = %path.display(), score = hit.score, "Recalled record");
    Some(RecalledRecord {
        path: ctx.display_path(&path),
        score: hit.score,
        title: hit
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| display_title(&hit.path)),
        memory_type: record.meta.memory_type,
        tags: record.meta.tags.unwrap_or_default(),
        created: super::format_timestamp(&record.meta.created),
        modified: super::format_timestamp(&record.meta.modified),
        content: record.content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{FakeIndex, Fixture};
    use historian_config::PluginConfig;
    use serde_json::json;

    fn store(fx: &Fixture, memory_type: &str, name: &str, content: &str) -> String {
        let dir = fx.root.join(".mnemonics").join(memory_type);
        std::fs::create_dir_all(&dir).unwrap();
        MemoryRecord::create(content, memory_type, Some(vec!["t".into()]))
            .write(&dir.join(name))
            .unwrap();
        format!("qmd://{memory_type}/{name}")
    }

    fn query(q: &str) -> RecallParams {
        RecallParams {
            query: Some(q.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_returns_parsed_records() {
        let fx = Fixture::new();
        let uri = store(&fx, "learning", "use-tokio.md", "Tokio everywhere.");
        fx.index.set_search_results(vec![SearchResult::new(uri, 0.87)]);

        let out = run(&fx.ctx, query("async runtime")).await.unwrap();
        assert_eq!(out.count, 1);
        assert!(out.message.is_none());
        let record = &out.records[0];
        assert_eq!(record.path, ".mnemonics/learning/use-tokio.md");
        assert_eq!(record.title, "Use Tokio");
        assert_eq!(record.memory_type, "learning");
        assert_eq!(record.tags, vec!["t"]);
        assert_eq!(record.content, "Tokio everywhere.");
        assert!((record.score - 0.87).abs() < f64::EPSILON);

        assert_eq!(
            fx.index.calls(),
            vec!["search semantic-vector async runtime None 10"]
        );
    }

    #[tokio::test]
    async fn test_search_options_follow_params() {
        let fx = Fixture::new();
        let params = RecallParams {
            query: Some("naming".into()),
            memory_type: Some("Naming Convention".into()),
            limit: Some(3),
            mode: SearchMode::HybridDeep,
            fetch_all: false,
        };
        run(&fx.ctx, params).await.unwrap();
        assert_eq!(
            fx.index.calls(),
            vec!["search hybrid-deep naming Some(\"naming-convention\") 3"]
        );
    }

    #[tokio::test]
    async fn test_empty_search_yields_message() {
        let fx = Fixture::new();
        let out = run(&fx.ctx, query("nothing")).await.unwrap();
        assert_eq!(out.count, 0);
        assert!(out.records.is_empty());
        assert!(out.message.unwrap().contains("nothing"));

        let value = serde_json::to_value(run(&fx.ctx, query("x")).await.unwrap()).unwrap();
        assert_eq!(value["records"], json!([]));
        assert_eq!(value["count"], 0);
    }

    #[tokio::test]
    async fn test_non_records_and_unreadable_files_skipped() {
        let fx = Fixture::new();
        let good = store(&fx, "issue", "bug.md", "broken");
        let dir = fx.root.join(".mnemonics/issue");
        std::fs::write(dir.join("plain.md"), "no header").unwrap();
        fx.index.set_search_results(vec![
            SearchResult::new("qmd://issue/notes.txt", 0.9),
            SearchResult::new("qmd://issue/plain.md", 0.8),
            SearchResult::new("qmd://issue/missing.md", 0.7),
            SearchResult::new(good, 0.6),
        ]);

        let out = run(&fx.ctx, query("bug")).await.unwrap();
        assert_eq!(out.count, 1);
        assert_eq!(out.records[0].path, ".mnemonics/issue/bug.md");
    }

    #[tokio::test]
    async fn test_fetch_all_single_type() {
        let fx = Fixture::new();
        let uri = store(&fx, "context", "stack.md", "Rust");
        fx.index.add_document("context", SearchResult::new(uri, 0.0));

        let params = RecallParams {
            memory_type: Some("context".into()),
            fetch_all: true,
            ..Default::default()
        };
        let out = run(&fx.ctx, params).await.unwrap();
        assert_eq!(out.count, 1);
        assert_eq!(fx.index.calls(), vec!["multi-get context my-project"]);
    }

    #[tokio::test]
    async fn test_fetch_all_every_collection() {
        let fx = Fixture::new();
        let a = store(&fx, "context", "a.md", "A");
        let b = store(&fx, "issue", "b.md", "B");
        fx.index
            .collections
            .lock()
            .unwrap()
            .extend(["context".to_string(), "issue".to_string()]);
        fx.index.add_document("context", SearchResult::new(a, 0.0));
        fx.index.add_document("issue", SearchResult::new(b, 0.0));

        let params = RecallParams {
            fetch_all: true,
            ..Default::default()
        };
        let out = run(&fx.ctx, params).await.unwrap();
        assert_eq!(out.count, 2);
        assert_eq!(
            fx.index.calls(),
            vec![
                "list my-project",
                "multi-get context my-project",
                "multi-get issue my-project"
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_list_failure_degrades() {
        let index = FakeIndex {
            fail_list: true,
            ..Default::default()
        };
        let fx = Fixture::with(PluginConfig::default(), index);
        let params = RecallParams {
            fetch_all: true,
            ..Default::default()
        };
        let out = run(&fx.ctx, params).await.unwrap();
        assert_eq!(out.count, 0);
        assert!(out.message.is_some());
    }

    #[tokio::test]
    async fn test_query_required_without_fetch_all() {
        let fx = Fixture::new();
        let err = run(&fx.ctx, query("   ")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HistorianError>(),
            Some(HistorianError::Validation(_))
        ));
        assert!(fx.index.calls().is_empty());
    }

    #[test]
    fn test_params_from_args() {
        let params = RecallParams::from_args(&json!({
            "query": "q",
            "limit": "5",
            "mode": "keyword",
            "fetchAll": false
        }))
        .unwrap();
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.mode, SearchMode::ExactKeyword);

        let defaults = RecallParams::from_args(&json!({"query": "q"})).unwrap();
        assert_eq!(defaults.mode, SearchMode::SemanticVector);
        assert!(!defaults.fetch_all);

        assert!(RecallParams::from_args(&json!({"mode": "fuzzy"})).is_err());
        assert!(RecallParams::from_args(&json!({"limit": 0})).is_err());
    }
}
