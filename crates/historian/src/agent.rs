//! The Historian sub-agent definition handed to the host assistant.

use std::sync::LazyLock;

use historian_config::{IntegrationConfig, PluginConfig, builtin_integrations};
use historian_core::MemoryType;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::tools;

const INSTRUCTIONS: &str = include_str!("historian_instructions.xml");
const CUSTOM_MAPPINGS_PLACEHOLDER: &str = "<!--CUSTOM_TYPE_MAPPINGS-->";
const VALID_TYPES_CLOSE: &str = "  </valid_types>";
const TYPE_COLUMN_WIDTH: usize = 25;

/// Capabilities the Historian must never use.
pub const DENIED_PERMISSIONS: [&str; 4] = ["edit", "write", "bash", "webfetch"];

static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));
static LINE_INDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*").expect("valid regex"));

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub instructions: String,
    pub auto_compound: bool,
    pub tools: Map<String, Value>,
    pub permission: Map<String, Value>,
}

/// Build the agent from resolved configuration.
pub fn historian_agent(config: &PluginConfig) -> AgentDefinition {
    let tools = tools::all_specs()
        .iter()
        .map(|spec| (spec.name.to_string(), Value::Bool(true)))
        .collect();
    let permission = DENIED_PERMISSIONS
        .iter()
        .map(|p| (p.to_string(), json!("deny")))
        .collect();

    AgentDefinition {
        name: "historian",
        description: "Memory management specialist for contextual information",
        mode: "subagent",
        model: config.model.clone(),
        temperature: config.temperature,
        prompt: config.append_prompt.clone(),
        instructions: compact(&render_instructions(config.custom_memory_types())),
        auto_compound: config.auto_compound,
        tools,
        permission,
    }
}

/// Instruction text with custom types injected, before compaction.
pub fn render_instructions(custom_types: &[MemoryType]) -> String {
    if custom_types.is_empty() {
        return INSTRUCTIONS.replace(CUSTOM_MAPPINGS_PLACEHOLDER, "");
    }

    let listing: String = custom_types
        .iter()
        .map(|t| {
            let name = escape_xml(&t.canonical_name());
            let quoted = format!("\"{name}\"");
            let description = if t.description.trim().is_empty() {
                "Custom memory type".to_string()
            } else {
                escape_xml(t.description.trim())
            };
            format!("    {quoted:<width$} - {description}\n", width = TYPE_COLUMN_WIDTH)
        })
        .collect();
    let mappings = custom_types
        .iter()
        .map(|t| {
            format!(
                "<hint words=\"{}\" type=\"{}\"/>",
                escape_xml(t.name.trim()),
                escape_xml(&t.canonical_name())
            )
        })
        .collect::<Vec<_>>()
        .join("\n  ");

    INSTRUCTIONS
        .replacen(VALID_TYPES_CLOSE, &format!("{listing}{VALID_TYPES_CLOSE}"), 1)
        .replace(CUSTOM_MAPPINGS_PLACEHOLDER, &mappings)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Drop indentation and whitespace between tags. Text inside tags and
/// attribute values is left as is.
pub fn compact(xml: &str) -> String {
    let joined = BETWEEN_TAGS.replace_all(xml, "><");
    LINE_INDENT.replace_all(&joined, "").trim().to_string()
}

/// JSON payload printed by `historian agent`.
pub fn agent_payload(config: &PluginConfig) -> Value {
    let integrations: Vec<IntegrationConfig> = builtin_integrations(&config.disabled_mcps);
    json!({
        "agent": historian_agent(config),
        "mcp": integrations,
    })
}
