use anyhow::{Context, Result};
use historian_core::{HistorianError, MemoryType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config_merge::{merge_json_values, normalize_aliases, warn_unknown_keys};
use crate::paths;
use crate::validate::validate_config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive usable in an `EnvFilter`.
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Resolved plugin settings (defaults < user file < project file).
///
/// Loaded once at startup and passed explicitly to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_prompt: Option<String>,
    #[serde(default)]
    pub memory_types: Vec<MemoryType>,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_true")]
    pub auto_compound: bool,
    /// Built-in integrations to leave out of the registry.
    #[serde(default)]
    pub disabled_mcps: Vec<String>,
    /// Extra directories indexed under the `context` collection at startup.
    #[serde(default)]
    pub external_paths: Vec<String>,
    #[serde(default = "default_index_binary")]
    pub index_binary: String,
    #[serde(default = "default_index_timeout_seconds")]
    pub index_timeout_seconds: u64,
}

fn default_temperature() -> f64 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_index_binary() -> String {
    "qmd".to_string()
}

fn default_index_timeout_seconds() -> u64 {
    120
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            append_prompt: None,
            memory_types: Vec::new(),
            log_level: LogLevel::default(),
            debug: false,
            auto_compound: true,
            disabled_mcps: Vec::new(),
            external_paths: Vec::new(),
            index_binary: default_index_binary(),
            index_timeout_seconds: default_index_timeout_seconds(),
        }
    }
}

impl PluginConfig {
    /// Load the effective configuration for `project_root`.
    ///
    /// Looks for `opencode-historian.jsonc` (then `.json`) under the user
    /// config dir and under `<project_root>/.opencode/`. Both files are
    /// optional. Unreadable layers are skipped with a warning; a merged result
    /// that fails to deserialize or validate is a fatal config error.
    pub fn load(project_root: &Path) -> Result<Self, HistorianError> {
        let user_path = paths::user_config_base().and_then(|base| paths::find_config_path(&base));
        let project_path = paths::find_config_path(&paths::project_config_base(project_root));
        Self::load_with_paths(user_path.as_deref(), project_path.as_deref())
    }

    /// Load config from explicit file paths. Testable without global filesystem state.
    pub fn load_with_paths(
        user_path: Option<&Path>,
        project_path: Option<&Path>,
    ) -> Result<Self, HistorianError> {
        let mut merged = Value::Object(Map::new());
        for path in [user_path, project_path].into_iter().flatten() {
            if let Some(layer) = load_layer(path) {
                merged = merge_json_values(merged, Value::Object(layer));
            }
        }

        let config: Self = serde_json::from_value(merged)
            .map_err(|e| HistorianError::Config(e.to_string()))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Paths of the config files that `load` would read, in precedence order.
    pub fn discovered_paths(project_root: &Path) -> Vec<PathBuf> {
        let user = paths::user_config_base().and_then(|base| paths::find_config_path(&base));
        let project = paths::find_config_path(&paths::project_config_base(project_root));
        user.into_iter().chain(project).collect()
    }

    /// Configured custom types with canonical names.
    pub fn custom_memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_seconds)
    }

    /// Filter directive for the tracing subscriber; `debug: true` wins.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            LogLevel::Debug.as_filter_directive()
        } else {
            self.log_level.as_filter_directive()
        }
    }
}

/// Read one config layer. `None` when the file is absent or unusable.
fn load_layer(path: &Path) -> Option<Map<String, Value>> {
    match read_layer(path) {
        Ok(layer) => layer,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Skipping unreadable config: {e:#}");
            None
        }
    }
}

fn read_layer(path: &Path) -> Result<Option<Map<String, Value>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read config: {}", path.display()));
        }
    };
    let raw: Value = json5::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    let Value::Object(mut layer) = raw else {
        anyhow::bail!("Top level of {} is not an object", path.display());
    };
    warn_unknown_keys(&layer, &path.display().to_string());
    normalize_aliases(&mut layer);
    Ok(Some(layer))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
