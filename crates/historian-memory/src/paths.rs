use std::path::{Component, Path, PathBuf};

use historian_core::{HistorianError, to_kebab_case};

/// Project-local directory that holds every memory record.
pub const MEMORY_DIR_NAME: &str = ".mnemonics";

/// URI scheme the indexer uses for documents in a collection.
const INDEX_URI_PREFIX: &str = "qmd://";

pub fn project_memory_root(project_root: &Path) -> PathBuf {
    project_root.join(MEMORY_DIR_NAME)
}

/// User-wide memory directory (`<config dir>/opencode/mnemonics`).
pub fn global_memory_root() -> Option<PathBuf> {
    historian_config::paths::user_config_dir()
        .map(|dir| dir.join(historian_config::paths::HOST_CONFIG_DIR).join("mnemonics"))
}

/// Index name for a project: kebab-case of the last `/`-separated segment.
pub fn derive_index_name(project_root: &str) -> Result<String, HistorianError> {
    if project_root.trim().is_empty() {
        return Err(HistorianError::InvalidProjectRoot(
            "projectRoot must be a non-empty string".to_string(),
        ));
    }
    let folder = project_root.rsplit('/').next().unwrap_or_default();
    let name = to_kebab_case(folder);
    if folder.trim().is_empty() || name.is_empty() {
        return Err(HistorianError::InvalidProjectRoot(
            "cannot extract folder name from path".to_string(),
        ));
    }
    Ok(name)
}

/// Absolute form of `path` with `.` and `..` folded without touching the
/// filesystem. `None` when a relative path cannot be anchored.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Some(normalized)
}

/// Whether `candidate` resolves strictly inside `<project_root>/.mnemonics`.
///
/// Mutating tools must refuse to act when this returns `false`.
pub fn is_within_memory_root(candidate: &Path, project_root: &Path) -> bool {
    let (Some(root), Some(candidate)) = (
        normalize_lexically(&project_memory_root(project_root)),
        normalize_lexically(candidate),
    ) else {
        return false;
    };
    candidate != root && candidate.starts_with(&root)
}

/// `qmd://<collection>/<rel>` → `<project_root>/.mnemonics/<collection>/<rel>`.
/// Other paths are returned unchanged.
pub fn index_path_to_fs_path(path: &str, project_root: &Path) -> PathBuf {
    match path.strip_prefix(INDEX_URI_PREFIX) {
        Some(relative) => project_memory_root(project_root).join(relative),
        None => PathBuf::from(path),
    }
}

/// Resolve a caller-supplied record reference: index URIs are mapped into
/// the memory root and relative paths are taken relative to the project root.
pub fn resolve_record_path(reference: &str, project_root: &Path) -> PathBuf {
    let path = index_path_to_fs_path(reference.trim(), project_root);
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

/// Human title from a record path: `use-tokio.md` → `Use Tokio`.
pub fn display_title(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    stem.replace('-', " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_index_name() {
        assert_eq!(derive_index_name("/a/b/my-project").unwrap(), "my-project");
        assert_eq!(
            derive_index_name("/a/b/MyAwesomeProject").unwrap(),
            "my-awesome-project"
        );
        assert_eq!(
            derive_index_name("/Users/dev/myAwesomeProject").unwrap(),
            "my-awesome-project"
        );
        assert_eq!(derive_index_name("relative").unwrap(), "relative");
    }

    #[test]
    fn test_derive_index_name_empty_root() {
        for root in ["", "   "] {
            let err = derive_index_name(root).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid project root: projectRoot must be a non-empty string"
            );
        }
    }

    #[test]
    fn test_derive_index_name_trailing_separator() {
        let err = derive_index_name("/path/to/folder/").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid project root: cannot extract folder name from path"
        );
    }

    #[test]
    fn test_within_memory_root() {
        let root = Path::new("/work/proj");
        assert!(is_within_memory_root(
            Path::new("/work/proj/.mnemonics/context/x.md"),
            root
        ));
        assert!(is_within_memory_root(
            Path::new("/work/proj/.mnemonics/context/../issue/./y.md"),
            root
        ));
    }

    #[test]
    fn test_outside_memory_root() {
        let root = Path::new("/work/proj");
        assert!(!is_within_memory_root(Path::new("/work/proj/../x.md"), root));
        assert!(!is_within_memory_root(Path::new("/work/proj/src/main.rs"), root));
        assert!(!is_within_memory_root(Path::new("/etc/passwd"), root));
        assert!(!is_within_memory_root(
            Path::new("/work/proj/.mnemonics/../escape.md"),
            root
        ));
        assert!(!is_within_memory_root(
            Path::new("/work/proj/.mnemonics-evil/x.md"),
            root
        ));
    }

    #[test]
    fn test_memory_root_itself_is_not_inside() {
        let root = Path::new("/work/proj");
        assert!(!is_within_memory_root(Path::new("/work/proj/.mnemonics"), root));
        assert!(!is_within_memory_root(Path::new("/work/proj/.mnemonics/"), root));
    }

    #[test]
    fn test_index_path_conversion() {
        let root = Path::new("/work/proj");
        assert_eq!(
            index_path_to_fs_path("qmd://conventions-pattern/file.md", root),
            PathBuf::from("/work/proj/.mnemonics/conventions-pattern/file.md")
        );
        assert_eq!(
            index_path_to_fs_path("/abs/file.md", root),
            PathBuf::from("/abs/file.md")
        );
    }

    #[test]
    fn test_resolve_record_path() {
        let root = Path::new("/work/proj");
        assert_eq!(
            resolve_record_path(".mnemonics/issue/a.md", root),
            PathBuf::from("/work/proj/.mnemonics/issue/a.md")
        );
        assert_eq!(
            resolve_record_path(" qmd://issue/a.md ", root),
            PathBuf::from("/work/proj/.mnemonics/issue/a.md")
        );
        assert_eq!(
            resolve_record_path("/elsewhere/a.md", root),
            PathBuf::from("/elsewhere/a.md")
        );
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("qmd://learning/use-tokio-runtime.md"), "Use Tokio Runtime");
        assert_eq!(display_title("plain.md"), "Plain");
        assert_eq!(display_title("/x/y/no-ext"), "No Ext");
    }
}
