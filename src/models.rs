//! Prompt library record types
//!
//! Every field except `id` may be missing in stored JSON; missing text reads as
//! empty and missing tags as an empty list.

use serde::{Deserialize, Serialize};

/// A prompt template, the searchable unit of the library
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Prompt {
    /// Timestamp used for date filtering and default ordering
    pub fn effective_timestamp(&self) -> Option<&str> {
        self.updated_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.created_at.as_deref().filter(|s| !s.is_empty()))
    }

    /// Tags joined by a single space, tokenized as one searchable field
    pub fn tags_text(&self) -> String {
        self.tags.join(" ")
    }
}

/// Category entry from the category provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Tag entry from the tag provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Payload for creating a prompt; id and timestamps are assigned by the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
}

impl PromptPatch {
    /// Apply the patch in place, returning whether anything changed
    pub fn apply_to(self, prompt: &mut Prompt) -> bool {
        let mut changed = false;
        if let Some(title) = self.title {
            changed |= prompt.title != title;
            prompt.title = title;
        }
        if let Some(description) = self.description {
            changed |= prompt.description != description;
            prompt.description = description;
        }
        if let Some(content) = self.content {
            changed |= prompt.content != content;
            prompt.content = content;
        }
        if let Some(tags) = self.tags {
            changed |= prompt.tags != tags;
            prompt.tags = tags;
        }
        if let Some(category) = self.category {
            changed |= prompt.category != category;
            prompt.category = category;
        }
        changed
    }
}
