//! Environment diagnostics for the Historian.

use std::path::Path;

use anyhow::Result;
use historian_config::{PluginConfig, paths};
use historian_core::{HistorianError, OutputFormat};
use historian_memory::{derive_index_name, global_memory_root, project_memory_root};
use historian_process::check_tool_installed;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl CheckStatus {
    fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Warn => "⚠",
            Self::Fail => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

/// Run all checks and print them. Returns `false` when any check failed.
pub fn run_doctor(
    project_root: &Path,
    config: &Result<PluginConfig, HistorianError>,
    format: OutputFormat,
) -> Result<bool> {
    let checks = collect_checks(project_root, config, paths::user_config_base().as_deref());
    let healthy = checks.iter().all(|c| c.status != CheckStatus::Fail);

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "healthy": healthy,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("=== Historian Environment Check ===");
            for check in &checks {
                println!("{} {:<16} {}", check.status.symbol(), check.name, check.detail);
            }
            println!();
            if healthy {
                println!("✓ All checks passed!");
            } else {
                println!("Issues found. See ✗ entries above.");
            }
        }
    }
    Ok(healthy)
}

pub fn collect_checks(
    project_root: &Path,
    config: &Result<PluginConfig, HistorianError>,
    user_config_base: Option<&Path>,
) -> Vec<Check> {
    let mut checks = Vec::new();

    let binary = match config {
        Ok(config) => config.index_binary.clone(),
        Err(_) => PluginConfig::default().index_binary,
    };
    checks.push(match check_tool_installed(&binary) {
        Ok(path) => Check::new("indexer", CheckStatus::Ok, format!("{binary} at {}", path.display())),
        Err(_) => Check::new(
            "indexer",
            CheckStatus::Fail,
            format!("{binary} is not installed. Run: npm install -g qmd"),
        ),
    });

    checks.push(match user_config_base.and_then(paths::find_config_path) {
        Some(path) => Check::new("user config", CheckStatus::Ok, path.display().to_string()),
        None => Check::new(
            "user config",
            CheckStatus::Warn,
            "not found. Run: historian install",
        ),
    });

    let project_base = paths::project_config_base(project_root);
    checks.push(match paths::find_config_path(&project_base) {
        Some(path) => Check::new("project config", CheckStatus::Ok, path.display().to_string()),
        None => Check::new("project config", CheckStatus::Ok, "none (optional)"),
    });

    checks.push(match config {
        Ok(_) => Check::new("config", CheckStatus::Ok, "valid"),
        Err(e) => Check::new("config", CheckStatus::Fail, e.to_string()),
    });

    checks.push(match derive_index_name(&project_root.to_string_lossy()) {
        Ok(name) => Check::new("index name", CheckStatus::Ok, name),
        Err(e) => Check::new("index name", CheckStatus::Fail, e.to_string()),
    });

    let memory_root = project_memory_root(project_root);
    checks.push(if memory_root.is_dir() {
        Check::new("memory root", CheckStatus::Ok, memory_root.display().to_string())
    } else {
        Check::new(
            "memory root",
            CheckStatus::Ok,
            format!("{} (created on first remember)", memory_root.display()),
        )
    });

    checks.push(match global_memory_root() {
        Some(dir) if dir.is_dir() => {
            Check::new("global memory", CheckStatus::Ok, dir.display().to_string())
        }
        Some(dir) => Check::new(
            "global memory",
            CheckStatus::Ok,
            format!("{} (not created)", dir.display()),
        ),
        None => Check::new("global memory", CheckStatus::Warn, "cannot resolve user config dir"),
    });

    checks.push(match paths::state_dir() {
        Some(dir) => Check::new("state dir", CheckStatus::Ok, dir.display().to_string()),
        None => Check::new(
            "state dir",
            CheckStatus::Warn,
            format!("unresolved, using {}", paths::state_dir_fallback().display()),
        ),
    });

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(checks: &'a [Check], name: &str) -> &'a Check {
        checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_missing_indexer_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PluginConfig {
            index_binary: "definitely-not-a-real-indexer-xyz".into(),
            ..Default::default()
        };
        let checks = collect_checks(tmp.path(), &Ok(config), None);
        assert_eq!(find(&checks, "indexer").status, CheckStatus::Fail);
        assert_eq!(find(&checks, "user config").status, CheckStatus::Warn);
    }

    #[test]
    fn test_config_files_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let user_base = tmp.path().join("user/opencode-historian");
        std::fs::create_dir_all(user_base.parent().unwrap()).unwrap();
        std::fs::write(tmp.path().join("user/opencode-historian.jsonc"), "{}").unwrap();
        let project = tmp.path().join("proj");
        std::fs::create_dir_all(project.join(".opencode")).unwrap();
        std::fs::write(project.join(".opencode/opencode-historian.json"), "{}").unwrap();

        let checks = collect_checks(&project, &Ok(PluginConfig::default()), Some(&user_base));
        let user = find(&checks, "user config");
        assert_eq!(user.status, CheckStatus::Ok);
        assert!(user.detail.ends_with("opencode-historian.jsonc"));
        assert!(find(&checks, "project config").detail.ends_with(".json"));
        assert_eq!(find(&checks, "index name").detail, "proj");
    }

    #[test]
    fn test_invalid_config_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = HistorianError::Config("temperature must be within [0, 2] (got 3)".into());
        let checks = collect_checks(tmp.path(), &Err(err), None);
        let config = find(&checks, "config");
        assert_eq!(config.status, CheckStatus::Fail);
        assert!(config.detail.contains("temperature"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let check = Check::new("x", CheckStatus::Warn, "d");
        let value = serde_json::to_value(check).unwrap();
        assert_eq!(value["status"], "warn");
    }
}
