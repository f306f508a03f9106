//! Memory-type taxonomy and canonical name normalization.
//!
//! Canonical names are kebab-case lowercase (`architectural-decision`). The
//! same string is written to record front matter as `memory_type`, used as the
//! storage subdirectory, and used as the index collection name.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::HistorianError;

/// Type used when classification is ambiguous.
pub const FALLBACK_MEMORY_TYPE: &str = "context";

pub const FALLBACK_DESCRIPTION: &str = "General context information - use when no other type fits";

/// Built-in memory types, always available regardless of configuration.
pub const BUILTIN_MEMORY_TYPES: [&str; 9] = [
    "architectural-decision",
    "design-decision",
    "learning",
    "user-preference",
    "project-preference",
    "issue",
    "context",
    "recurring-pattern",
    "conventions-pattern",
];

const BUILTIN_DESCRIPTIONS: [&str; 9] = [
    "High-level system architecture choices and their rationale (e.g., technology stack, system design)",
    "UI/UX or component-level design choices and their reasoning",
    "Insights, lessons learned, or discoveries made during development",
    "Personal preferences of the user (coding style, workflow, tools)",
    "Project-specific conventions and preferences (patterns, libraries used)",
    "Known issues, bugs, or problems encountered and their status",
    "General context information, background knowledge, or miscellaneous memories (DEFAULT fallback type)",
    "Patterns that occur repeatedly in the codebase or development process",
    "Coding conventions, naming patterns, and style guidelines for the project",
];

/// A taxonomy entry, built-in or declared in configuration (`memoryTypes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl MemoryType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            template: None,
        }
    }

    /// Canonical form of this type's name.
    pub fn canonical_name(&self) -> String {
        to_kebab_case(&self.name)
    }
}

pub fn builtin_memory_types() -> Vec<MemoryType> {
    BUILTIN_MEMORY_TYPES
        .iter()
        .zip(BUILTIN_DESCRIPTIONS.iter())
        .map(|(name, description)| MemoryType::new(*name, *description))
        .collect()
}

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_/]").expect("valid regex"));
static EDGE_HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-+|-+$").expect("valid regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Convert a string to kebab-case.
///
/// Handles camelCase, PascalCase, spaces, underscores and slashes:
/// `"Naming Convention"`, `"naming_convention"`, `"namingConvention"` and
/// `"naming/convention"` all become `"naming-convention"`. Idempotent.
pub fn to_kebab_case(input: &str) -> String {
    let mut split = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        if ch.is_ascii_uppercase() {
            split.push('-');
        }
        split.push(ch);
    }
    let lowered = split.to_lowercase();

    let hyphenated = SEPARATORS.replace_all(&lowered, "-");
    let trimmed = EDGE_HYPHENS.replace_all(&hyphenated, "");
    HYPHEN_RUNS.replace_all(&trimmed, "-").into_owned()
}

/// Whether `memory_type` (in any casing) names a built-in or custom type.
pub fn is_valid_memory_type(memory_type: &str, custom_types: &[MemoryType]) -> bool {
    let normalized = to_kebab_case(memory_type);
    if normalized.is_empty() {
        return false;
    }
    BUILTIN_MEMORY_TYPES.contains(&normalized.as_str())
        || custom_types
            .iter()
            .any(|custom| custom.canonical_name() == normalized)
}

/// Normalize and validate a caller-supplied type, returning its canonical name.
pub fn resolve_memory_type(
    memory_type: &str,
    custom_types: &[MemoryType],
) -> Result<String, HistorianError> {
    if !is_valid_memory_type(memory_type, custom_types) {
        return Err(HistorianError::UnknownMemoryType(memory_type.to_string()));
    }
    Ok(to_kebab_case(memory_type))
}
