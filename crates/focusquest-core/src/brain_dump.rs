//! Free-text idea capture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainDumpEntry {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub processed: bool,
}

impl BrainDumpEntry {
    /// Build an entry from raw text: content is trimmed and `#hashtags`
    /// are lifted into lower-cased tags.
    pub fn capture(id: impl Into<String>, content: &str, created_at: DateTime<Utc>) -> Self {
        let content = content.trim().to_string();
        let tags = extract_hashtags(&content);
        Self {
            id: id.into(),
            content,
            created_at,
            tags,
            processed: false,
        }
    }

    /// Case-insensitive substring match on the content.
    pub fn matches(&self, needle: &str) -> bool {
        self.content
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

/// Collect `#word` tags in order of appearance, lower-cased.
///
/// A tag is a `#` followed by one or more word characters
/// (alphanumerics or `_`); a bare `#` is ignored.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut tag = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                tag.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            tags.push(tag.to_lowercase());
        }
    }
    tags
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainDumpPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
}

impl BrainDumpPatch {
    pub fn processed() -> Self {
        Self {
            processed: Some(true),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, entry: &mut BrainDumpEntry) {
        if let Some(content) = &self.content {
            entry.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
        if let Some(processed) = self.processed {
            entry.processed = processed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtags_are_lowercased_in_order() {
        assert_eq!(
            extract_hashtags("Call #Mom about #trip_plans, then #"),
            vec!["mom".to_string(), "trip_plans".to_string()]
        );
    }

    #[test]
    fn capture_trims_and_tags() {
        let entry = BrainDumpEntry::capture("e1", "  buy milk #errands \n", Utc::now());
        assert_eq!(entry.content, "buy milk #errands");
        assert_eq!(entry.tags, vec!["errands".to_string()]);
        assert!(!entry.processed);
    }

    #[test]
    fn matches_is_case_insensitive() {
        let entry = BrainDumpEntry::capture("e1", "Learn Rust", Utc::now());
        assert!(entry.matches("rust"));
        assert!(!entry.matches("go"));
    }
}
