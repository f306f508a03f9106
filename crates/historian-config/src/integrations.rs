use serde::{Deserialize, Serialize};

/// Launch configuration for an auxiliary MCP server the host should start
/// alongside the Historian agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub name: String,
    pub command: Vec<String>,
}

impl IntegrationConfig {
    fn new(name: &str, command: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|part| part.to_string()).collect(),
        }
    }
}

fn all_integrations() -> Vec<IntegrationConfig> {
    vec![
        IntegrationConfig::new("qmd", &["qmd", "mcp"]),
        IntegrationConfig::new(
            "serena",
            &[
                "uvx",
                "--from",
                "git+https://github.com/oraios/serena",
                "serena",
                "start-mcp-server",
                "--context",
                "ide-assistant",
                "--open-web-dashboard",
                "False",
            ],
        ),
    ]
}

/// Built-in integrations minus those named in `disabled` (case-insensitive).
pub fn builtin_integrations(disabled: &[String]) -> Vec<IntegrationConfig> {
    all_integrations()
        .into_iter()
        .filter(|integration| {
            !disabled
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(&integration.name))
        })
        .collect()
}
