use historian_core::{HistorianError, to_kebab_case};

use crate::config::PluginConfig;

/// Validate a merged configuration. Every failure is a startup-fatal
/// [`HistorianError::Config`].
pub fn validate_config(config: &PluginConfig) -> Result<(), HistorianError> {
    validate_temperature(config)?;
    validate_memory_types(config)?;
    validate_indexer(config)?;
    validate_external_paths(config)?;
    Ok(())
}

fn validate_temperature(config: &PluginConfig) -> Result<(), HistorianError> {
    let temperature = config.temperature;
    if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
        return Err(HistorianError::Config(format!(
            "temperature must be within [0, 2] (got {temperature})"
        )));
    }
    Ok(())
}

fn validate_memory_types(config: &PluginConfig) -> Result<(), HistorianError> {
    for (idx, memory_type) in config.memory_types.iter().enumerate() {
        if memory_type.name.trim().is_empty() {
            return Err(HistorianError::Config(format!(
                "memoryTypes[{idx}].name cannot be empty"
            )));
        }
        let canonical = to_kebab_case(&memory_type.name);
        if canonical.is_empty() {
            return Err(HistorianError::Config(format!(
                "memoryTypes[{idx}].name \"{}\" has no usable characters",
                memory_type.name
            )));
        }
        // The canonical name is a directory under the memory root.
        if canonical.contains(['.', '/', '\\']) {
            return Err(HistorianError::Config(format!(
                "memoryTypes[{idx}].name \"{}\" must not contain '.' or path separators",
                memory_type.name
            )));
        }
    }
    Ok(())
}

fn validate_indexer(config: &PluginConfig) -> Result<(), HistorianError> {
    if config.index_binary.trim().is_empty() {
        return Err(HistorianError::Config(
            "indexBinary cannot be empty".to_string(),
        ));
    }
    if config.index_timeout_seconds == 0 {
        return Err(HistorianError::Config(
            "indexTimeoutSeconds must be > 0 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_external_paths(config: &PluginConfig) -> Result<(), HistorianError> {
    if let Some(idx) = config
        .external_paths
        .iter()
        .position(|path| path.trim().is_empty())
    {
        return Err(HistorianError::Config(format!(
            "externalPaths[{idx}] cannot be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use historian_core::MemoryType;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PluginConfig::default()).is_ok());
    }

    #[test]
    fn test_temperature_bounds_inclusive() {
        for t in [0.0, 2.0, 1.1] {
            let config = PluginConfig {
                temperature: t,
                ..Default::default()
            };
            assert!(validate_config(&config).is_ok(), "temperature {t}");
        }
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        for t in [-0.1, 2.01, f64::NAN, f64::INFINITY] {
            let config = PluginConfig {
                temperature: t,
                ..Default::default()
            };
            let err = validate_config(&config).unwrap_err();
            assert!(err.to_string().contains("temperature"), "got: {err}");
        }
    }

    #[test]
    fn test_blank_memory_type_name_rejected() {
        let config = PluginConfig {
            memory_types: vec![MemoryType::new("  ", "blank")],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("memoryTypes[0].name cannot be empty"));
    }

    #[test]
    fn test_unnormalizable_memory_type_name_rejected() {
        let config = PluginConfig {
            memory_types: vec![
                MemoryType::new("runbook", "ok"),
                MemoryType::new("_/_", "only separators"),
            ],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("memoryTypes[1]"), "got: {err}");
    }

    #[test]
    fn test_path_like_memory_type_name_rejected() {
        for name in ["..", "v1.2", "ops\\runbook"] {
            let config = PluginConfig {
                memory_types: vec![MemoryType::new(name, "escapes")],
                ..Default::default()
            };
            let err = validate_config(&config).unwrap_err();
            assert!(err.to_string().contains("path separators"), "{name}: {err}");
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PluginConfig {
            index_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(HistorianError::Config(msg)) if msg.contains("indexTimeoutSeconds")
        ));
    }

    #[test]
    fn test_empty_index_binary_rejected() {
        let config = PluginConfig {
            index_binary: " ".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_blank_external_path_rejected() {
        let config = PluginConfig {
            external_paths: vec!["/docs".to_string(), String::new()],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("externalPaths[1]"));
    }
}
