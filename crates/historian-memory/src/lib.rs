//! Memory records on disk and the external search index they are fed into.

pub mod index;
pub mod noop_index;
pub mod paths;
pub mod qmd;
pub mod record;

pub use index::{MemoryIndex, SearchOptions, SearchResult};
pub use noop_index::NoopIndex;
pub use paths::{
    MEMORY_DIR_NAME, derive_index_name, display_title, global_memory_root,
    index_path_to_fs_path, is_within_memory_root, project_memory_root, resolve_record_path,
};
pub use qmd::QmdIndex;
pub use record::{MemoryRecord, RecordMeta, format_timestamp, generate_filename, slugify};
