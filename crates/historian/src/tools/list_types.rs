use historian_core::{FALLBACK_DESCRIPTION, FALLBACK_MEMORY_TYPE, builtin_memory_types};
use serde::Serialize;

use super::args::ToolSpec;
use crate::context::ToolContext;

pub const SPEC: ToolSpec = ToolSpec {
    name: "memory_list_types",
    description: "List the memory types accepted by memory_remember, including project-specific ones.",
    params: &[],
};

#[derive(Debug, Clone, Serialize)]
pub struct TypeEntry {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTypesOutput {
    pub types: Vec<TypeEntry>,
    pub fallback_type: String,
    pub fallback_description: String,
}

pub fn run(ctx: &ToolContext) -> ListTypesOutput {
    let mut types: Vec<TypeEntry> = builtin_memory_types()
        .into_iter()
        .map(|t| TypeEntry {
            name: t.name,
            description: t.description,
            builtin: true,
            template: None,
        })
        .collect();

    for custom in ctx.config.custom_memory_types() {
        let name = custom.canonical_name();
        if name.is_empty() || types.iter().any(|t| t.name == name) {
            continue;
        }
        types.push(TypeEntry {
            name,
            description: custom.description.clone(),
            builtin: false,
            template: custom.template.clone(),
        });
    }

    ListTypesOutput {
        types,
        fallback_type: FALLBACK_MEMORY_TYPE.to_string(),
        fallback_description: FALLBACK_DESCRIPTION.to_string(),
    }
}
