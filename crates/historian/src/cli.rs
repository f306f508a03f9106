use clap::{Parser, Subcommand};
use historian_core::{OutputFormat, SearchMode};

#[derive(Parser)]
#[command(name = "historian")]
#[command(about = "Historian: persistent project memory for coding assistants")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Project root (defaults to CWD)
    #[arg(long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default user config if none exists
    Install,

    /// Check indexer availability and configuration
    Doctor,

    /// Serve the memory tools over MCP (JSON-RPC 2.0 on stdio)
    Serve,

    /// Print the Historian agent definition and integration registry
    Agent,

    /// Save a new memory, or update one by path
    Remember {
        /// Human title; becomes the file name
        #[arg(long)]
        title: String,

        /// Memory body (markdown)
        #[arg(long)]
        content: String,

        /// Memory type (built-in or configured custom type)
        #[arg(long = "type", default_value = "context")]
        memory_type: String,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Existing record to update instead of creating a new one
        #[arg(long)]
        target: Option<String>,
    },

    /// Search memories
    Recall {
        /// Search query; required unless --all
        query: Option<String>,

        /// Restrict to one memory type
        #[arg(long = "type")]
        memory_type: Option<String>,

        /// Maximum number of hits
        #[arg(short = 'n', long)]
        limit: Option<u64>,

        /// Search strategy
        #[arg(long, value_enum)]
        mode: Option<SearchMode>,

        /// Fetch every record (optionally of one type) instead of searching
        #[arg(long = "all")]
        fetch_all: bool,
    },

    /// Delete memories by path
    Forget {
        /// Record paths as returned by recall
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List built-in and custom memory types
    ListTypes,

    /// Register type directories and refresh the index
    Sync,
}
