use std::path::{Path, PathBuf};

/// Name used for the state directory (logs).
pub const APP_NAME: &str = "opencode-historian";
/// Base file name shared by the user and project config files.
pub const CONFIG_FILE_STEM: &str = "opencode-historian";
/// Directory under the user config dir owned by the host assistant.
pub const HOST_CONFIG_DIR: &str = "opencode";
/// Project-local dot-directory that holds the project config file.
pub const PROJECT_CONFIG_DIR: &str = ".opencode";

fn user_config_dir_from(xdg_config_home: Option<&str>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = xdg_config_home.filter(|dir| !dir.trim().is_empty()) {
        return Some(PathBuf::from(dir));
    }
    home.map(|home| home.join(".config"))
}

/// User config directory: `$XDG_CONFIG_HOME`, falling back to `~/.config`
/// on every platform (the host assistant uses the same convention).
pub fn user_config_dir() -> Option<PathBuf> {
    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let base_dirs = directories::BaseDirs::new();
    user_config_dir_from(xdg.as_deref(), base_dirs.as_ref().map(|dirs| dirs.home_dir()))
}

/// User-level config path without extension.
pub fn user_config_base() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(HOST_CONFIG_DIR).join(CONFIG_FILE_STEM))
}

/// Project-level config path without extension.
pub fn project_config_base(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_DIR).join(CONFIG_FILE_STEM)
}

/// Locate a config file for `base`, preferring `.jsonc` over `.json`.
pub fn find_config_path(base: &Path) -> Option<PathBuf> {
    let jsonc = with_extension(base, "jsonc");
    if jsonc.is_file() {
        return Some(jsonc);
    }
    let json = with_extension(base, "json");
    if json.is_file() {
        return Some(json);
    }
    None
}

/// Append an extension to a base path that has none of its own.
pub fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// State directory for log files.
pub fn state_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf()
    })
}

pub fn state_dir_fallback() -> PathBuf {
    std::env::temp_dir().join(format!("{APP_NAME}-state"))
}
