//! Tool parameter declarations and boundary normalization.
//!
//! Each tool declares its parameters as a static [`ParamSpec`] table. The
//! table drives both the JSON schema advertised to MCP clients and the
//! readers below, which coerce loose inputs (a bare string where a list is
//! expected) before any tool logic runs.

use historian_core::HistorianError;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    OptionalString,
    /// A list of strings; a single string is accepted and wrapped.
    StringList,
    OptionalStringList,
    OptionalInteger,
    OptionalBoolean,
}

impl ParamKind {
    pub fn is_required(self) -> bool {
        matches!(self, Self::String | Self::StringList)
    }

    /// JSON-schema fragment for this kind.
    pub fn wire_schema(self) -> Value {
        match self {
            Self::String | Self::OptionalString => json!({"type": "string"}),
            Self::StringList | Self::OptionalStringList => json!({
                "anyOf": [
                    {"type": "string"},
                    {"type": "array", "items": {"type": "string"}}
                ]
            }),
            Self::OptionalInteger => json!({"type": "integer", "minimum": 1}),
            Self::OptionalBoolean => json!({"type": "boolean"}),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            let mut schema = param.kind.wire_schema();
            if let Value::Object(obj) = &mut schema {
                obj.insert("description".to_string(), json!(param.description));
            }
            properties.insert(param.name.to_string(), schema);
            if param.kind.is_required() {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn invalid(message: String) -> HistorianError {
    HistorianError::Validation(message)
}

/// Borrowed view over a tool's argument object.
pub struct ToolArgs<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> ToolArgs<'a> {
    /// `null` is treated as an empty argument object.
    pub fn new(args: &'a Value) -> Result<Self, HistorianError> {
        match args {
            Value::Object(map) => Ok(Self { map: Some(map) }),
            Value::Null => Ok(Self { map: None }),
            other => Err(invalid(format!("arguments must be an object (got {other})"))),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map
            .and_then(|map| map.get(name))
            .filter(|value| !value.is_null())
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<String>, HistorianError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(format!("{name} must be a string (got {other})"))),
        }
    }

    pub fn string(&self, name: &str) -> Result<String, HistorianError> {
        self.optional_string(name)?
            .ok_or_else(|| invalid(format!("{name} is required")))
    }

    /// Blank strings are dropped; `None` when the parameter is absent.
    pub fn optional_string_list(&self, name: &str) -> Result<Option<Vec<String>>, HistorianError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        Ok(Some(coerce_string_list(name, value)?))
    }

    pub fn string_list(&self, name: &str) -> Result<Vec<String>, HistorianError> {
        let list = self.optional_string_list(name)?.unwrap_or_default();
        if list.is_empty() {
            return Err(invalid(format!("{name} must contain at least one entry")));
        }
        Ok(list)
    }

    pub fn optional_integer(&self, name: &str) -> Result<Option<u64>, HistorianError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) | None => Err(invalid(format!("{name} must be a positive integer (got {n})"))),
                Some(value) => Ok(Some(value)),
            },
            Some(Value::String(s)) => match s.trim().parse::<u64>() {
                Ok(value) if value > 0 => Ok(Some(value)),
                _ => Err(invalid(format!("{name} must be a positive integer (got \"{s}\")"))),
            },
            Some(other) => Err(invalid(format!("{name} must be a positive integer (got {other})"))),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, HistorianError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(Some(true)),
                "false" | "no" => Ok(Some(false)),
                _ => Err(invalid(format!("{name} must be a boolean (got \"{s}\")"))),
            },
            Some(other) => Err(invalid(format!("{name} must be a boolean (got {other})"))),
        }
    }
}

/// Single string or array of strings → list of trimmed, non-blank strings.
/// A JSON-encoded array inside a string is unpacked too.
pub fn coerce_string_list(name: &str, value: &Value) -> Result<Vec<String>, HistorianError> {
    let items: Vec<String> = match value {
        Value::String(s) => {
            let trimmed = s.trim();
            match serde_json::from_str::<Vec<String>>(trimmed) {
                Ok(list) if trimmed.starts_with('[') => list,
                _ => vec![trimmed.to_string()],
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(invalid(format!("{name} entries must be strings (got {other})"))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(invalid(format!(
                "{name} must be a string or a list of strings (got {other})"
            )));
        }
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: ToolSpec = ToolSpec {
        name: "demo",
        description: "demo tool",
        params: &[
            ParamSpec {
                name: "title",
                kind: ParamKind::String,
                description: "a title",
            },
            ParamSpec {
                name: "tags",
                kind: ParamKind::OptionalStringList,
                description: "tags",
            },
            ParamSpec {
                name: "limit",
                kind: ParamKind::OptionalInteger,
                description: "limit",
            },
        ],
    };

    #[test]
    fn test_input_schema_from_table() {
        let schema = SPEC.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["title"]));
        assert_eq!(schema["properties"]["title"]["type"], "string");
        assert_eq!(schema["properties"]["title"]["description"], "a title");
        assert!(schema["properties"]["tags"]["anyOf"].is_array());
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
    }

    #[test]
    fn test_wire_types_per_kind() {
        assert_eq!(ParamKind::OptionalBoolean.wire_schema(), json!({"type": "boolean"}));
        assert!(ParamKind::StringList.is_required());
        assert!(!ParamKind::OptionalStringList.is_required());
        assert!(!ParamKind::OptionalString.is_required());
    }

    #[test]
    fn test_string_list_coercion() {
        let single = json!({"paths": " a.md "});
        let args = ToolArgs::new(&single).unwrap();
        assert_eq!(args.string_list("paths").unwrap(), vec!["a.md"]);

        let many = json!({"paths": ["a.md", "", "b.md"]});
        let args = ToolArgs::new(&many).unwrap();
        assert_eq!(args.string_list("paths").unwrap(), vec!["a.md", "b.md"]);

        let encoded = json!({"paths": "[\"a.md\", \"b.md\"]"});
        let args = ToolArgs::new(&encoded).unwrap();
        assert_eq!(args.string_list("paths").unwrap(), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_string_list_rejects_empty_and_non_strings() {
        let empty = json!({"paths": []});
        assert!(ToolArgs::new(&empty).unwrap().string_list("paths").is_err());
        let missing = json!({});
        assert!(ToolArgs::new(&missing).unwrap().string_list("paths").is_err());
        let numbers = json!({"paths": [1, 2]});
        assert!(ToolArgs::new(&numbers).unwrap().string_list("paths").is_err());
    }

    #[test]
    fn test_required_and_optional_strings() {
        let value = json!({"title": "T", "blank": "  ", "num": 3});
        let args = ToolArgs::new(&value).unwrap();
        assert_eq!(args.string("title").unwrap(), "T");
        assert!(args.optional_string("blank").unwrap().is_none());
        assert!(args.string("missing").is_err());
        assert!(args.optional_string("num").is_err());
    }

    #[test]
    fn test_integers_and_booleans() {
        let value = json!({"a": 5, "b": "7", "c": 0, "d": true, "e": "no", "f": -1});
        let args = ToolArgs::new(&value).unwrap();
        assert_eq!(args.optional_integer("a").unwrap(), Some(5));
        assert_eq!(args.optional_integer("b").unwrap(), Some(7));
        assert!(args.optional_integer("c").is_err());
        assert!(args.optional_integer("f").is_err());
        assert_eq!(args.optional_bool("d").unwrap(), Some(true));
        assert_eq!(args.optional_bool("e").unwrap(), Some(false));
        assert_eq!(args.optional_bool("zzz").unwrap(), None);
    }

    #[test]
    fn test_null_arguments_are_empty() {
        let args = ToolArgs::new(&Value::Null).unwrap();
        assert!(args.optional_string("x").unwrap().is_none());
        assert!(ToolArgs::new(&json!([1])).is_err());
    }
}
