use serde_json::{Map, Value};

/// Keys whose array values accumulate across layers instead of being replaced.
const CONCATENATED_KEYS: &[&str] = &["memoryTypes"];

/// Older spelling accepted for `disabledMcps`.
const DISABLED_ALIAS: &str = "disabledIntegrations";
const DISABLED_KEY: &str = "disabledMcps";

/// Top-level keys understood by `PluginConfig`.
pub(crate) const KNOWN_KEYS: &[&str] = &[
    "$schema",
    "model",
    "temperature",
    "appendPrompt",
    "memoryTypes",
    "logLevel",
    "debug",
    "autoCompound",
    "disabledMcps",
    "disabledIntegrations",
    "externalPaths",
    "indexBinary",
    "indexTimeoutSeconds",
];

/// Warn about top-level keys serde would silently ignore.
pub(crate) fn warn_unknown_keys(raw: &Map<String, Value>, source: &str) {
    for key in raw.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!(config = source, key = %key, "Ignoring unknown config key");
        }
    }
}

/// Fold the `disabledIntegrations` alias into `disabledMcps` within one layer.
///
/// Both spellings in the same file are unioned, canonical entries first.
pub(crate) fn normalize_aliases(layer: &mut Map<String, Value>) {
    let Some(alias) = layer.remove(DISABLED_ALIAS) else {
        return;
    };
    match layer.get_mut(DISABLED_KEY) {
        Some(Value::Array(existing)) => {
            if let Value::Array(extra) = alias {
                for item in extra {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
        }
        Some(_) => {}
        None => {
            layer.insert(DISABLED_KEY.to_string(), alias);
        }
    }
}

/// Deep merge two JSON values. Overlay wins for non-object values, objects
/// merge recursively, and `memoryTypes` arrays are concatenated.
pub(crate) fn merge_json_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged_val = match base_map.remove(&key) {
                    Some(Value::Array(mut base_items))
                        if CONCATENATED_KEYS.contains(&key.as_str()) =>
                    {
                        match overlay_val {
                            Value::Array(overlay_items) => {
                                base_items.extend(overlay_items);
                                Value::Array(base_items)
                            }
                            other => other,
                        }
                    }
                    Some(base_val) => merge_json_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged_val);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
