use std::path::Path;

use anyhow::{Context, Result};
use historian_config::{install_default_config, paths};
use historian_core::OutputFormat;

/// Write the default user config unless one exists.
pub(crate) fn handle_install(format: OutputFormat) -> Result<()> {
    let base = paths::user_config_base().context("Cannot determine the user config directory")?;
    install_into(&base, format)
}

fn install_into(base: &Path, format: OutputFormat) -> Result<()> {
    let written = install_default_config(base)?;
    let existing = match &written {
        Some(_) => None,
        None => paths::find_config_path(base),
    };

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "created": written.is_some(),
                "path": written
                    .as_ref()
                    .or(existing.as_ref())
                    .map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            match (&written, &existing) {
                (Some(path), _) => eprintln!("Created default config: {}", path.display()),
                (None, Some(path)) => eprintln!("Config already present: {}", path.display()),
                (None, None) => {}
            }
            eprintln!("Installation complete!");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("opencode/opencode-historian");

        install_into(&base, OutputFormat::Json).unwrap();
        let path = tmp.path().join("opencode/opencode-historian.json");
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("\"autoCompound\": true"));

        std::fs::write(&path, "{\"temperature\": 1.0}").unwrap();
        install_into(&base, OutputFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"temperature\": 1.0}");
    }
}
