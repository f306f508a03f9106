use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Search strategy delegated to the external indexer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// BM25 keyword match.
    ExactKeyword,
    /// Embedding similarity.
    #[default]
    SemanticVector,
    /// Query expansion plus reranking; slowest.
    HybridDeep,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactKeyword => "exact-keyword",
            Self::SemanticVector => "semantic-vector",
            Self::HybridDeep => "hybrid-deep",
        }
    }

    /// Parse a caller-supplied mode. Accepts the indexer's own subcommand
    /// names (`search`, `vsearch`, `query`) as aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact-keyword" | "keyword" | "search" => Some(Self::ExactKeyword),
            "semantic-vector" | "vector" | "vsearch" => Some(Self::SemanticVector),
            "hybrid-deep" | "hybrid" | "query" => Some(Self::HybridDeep),
            _ => None,
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output format for CLI responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
