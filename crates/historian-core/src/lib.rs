//! Shared types for the Historian memory workspace: error taxonomy,
//! memory-type taxonomy, and CLI-facing enums.

pub mod error;
pub mod memory_type;
pub mod types;

pub use error::HistorianError;
pub use memory_type::{
    BUILTIN_MEMORY_TYPES, FALLBACK_DESCRIPTION, FALLBACK_MEMORY_TYPE, MemoryType,
    builtin_memory_types, is_valid_memory_type, resolve_memory_type, to_kebab_case,
};
pub use types::{OutputFormat, SearchMode};
