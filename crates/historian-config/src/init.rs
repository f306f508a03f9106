use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::paths::{find_config_path, with_extension};

/// Model suggested for the Historian agent in a fresh install.
pub const DEFAULT_MODEL: &str = "opencode/kimi-k2.5-free";

/// Content of a freshly installed user config.
pub fn default_config_json() -> serde_json::Value {
    json!({
        "model": DEFAULT_MODEL,
        "temperature": 0.3,
        "autoCompound": true,
        "logLevel": "info",
        "debug": false,
    })
}

/// Write the default config to `<base>.json` unless `<base>.json` or
/// `<base>.jsonc` already exists.
///
/// Returns the written path, or `None` when a config was already present.
pub fn install_default_config(base: &Path) -> Result<Option<PathBuf>> {
    if find_config_path(base).is_some() {
        return Ok(None);
    }

    let path = with_extension(base, "json");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(&default_config_json())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    tracing::info!(path = %path.display(), "Created default config");
    Ok(Some(path))
}
