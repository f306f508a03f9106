use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use historian_core::HistorianError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

const DELIMITER: &str = "---";

/// Front-matter header of a memory record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub modified: DateTime<Utc>,
    pub memory_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
}

/// ISO-8601 with millisecond precision, e.g. `2025-01-02T03:04:05.123Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

/// Current time truncated to the stored precision.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One persisted memory: YAML header plus free-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord {
    pub meta: RecordMeta,
    pub content: String,
}

impl MemoryRecord {
    /// Build a new record in memory. Nothing is written.
    pub fn create(content: impl Into<String>, memory_type: impl Into<String>, tags: Option<Vec<String>>) -> Self {
        let now = now();
        Self {
            meta: RecordMeta {
                id: Ulid::new().to_string(),
                created: now,
                modified: now,
                memory_type: memory_type.into(),
                tags,
                related: None,
            },
            content: content.into(),
        }
    }

    pub fn parse(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read memory record: {}", path.display()))?;
        Self::from_text(path, &text)
    }

    /// Async counterpart of [`MemoryRecord::parse`] for tool flows.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read memory record: {}", path.display()))?;
        Self::from_text(path, &text)
    }

    fn from_text(path: &Path, text: &str) -> Result<Self> {
        Self::parse_str(text).map_err(|reason| {
            HistorianError::MalformedRecord {
                path: path.display().to_string(),
                reason,
            }
            .into()
        })
    }

    fn parse_str(text: &str) -> std::result::Result<Self, String> {
        let (header, body) =
            split_front_matter(text).ok_or_else(|| "missing front matter".to_string())?;
        let meta: RecordMeta =
            serde_yaml::from_str(header).map_err(|e| format!("invalid front matter: {e}"))?;
        Ok(Self {
            meta,
            content: body.to_string(),
        })
    }

    /// Serialize header and body to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()?)
            .with_context(|| format!("Failed to write memory record: {}", path.display()))
    }

    /// Async counterpart of [`MemoryRecord::write`] for tool flows.
    pub async fn save(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.render()?)
            .await
            .with_context(|| format!("Failed to write memory record: {}", path.display()))
    }

    fn render(&self) -> Result<String> {
        let header = serde_yaml::to_string(&self.meta).context("failed to serialize front matter")?;
        let mut text = String::with_capacity(header.len() + self.content.len() + 8);
        text.push_str(DELIMITER);
        text.push('\n');
        text.push_str(&header);
        if !header.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(DELIMITER);
        text.push('\n');
        text.push_str(&self.content);
        Ok(text)
    }

    /// Advance `modified`. Always moves forward, by 1ms when the clock has not.
    pub fn touch(&mut self) {
        let floor = self.meta.modified.max(self.meta.created);
        let now = now();
        self.meta.modified = if now > floor {
            now
        } else {
            floor + Duration::milliseconds(1)
        };
    }
}

/// Split `---\n<header>\n---\n<body>`. The closing delimiter must sit on its own line.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Filesystem-safe slug for a record title, possibly empty.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let trimmed = stripped.trim();
    let hyphenated = WHITESPACE.replace_all(trimmed, "-");
    HYPHENS
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

/// `<slug>.md` for a title; titles with no usable characters are rejected.
pub fn generate_filename(title: &str) -> Result<String, HistorianError> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(HistorianError::Validation(format!(
            "title \"{title}\" does not produce a usable file name"
        )));
    }
    Ok(format!("{slug}.md"))
}
