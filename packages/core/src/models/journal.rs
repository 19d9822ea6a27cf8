//! Journal entries

use crate::models::{Record, RecordId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Great,
    Good,
    #[default]
    Neutral,
    Bad,
    Terrible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDraft {
    pub title: String,
    pub content: String,
    pub mood: Mood,
}

impl JournalDraft {
    /// Full patch carrying every draft field (used when editing an entry)
    pub fn to_patch(&self) -> JournalPatch {
        JournalPatch {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            mood: Some(self.mood),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl Record for JournalEntry {
    type Draft = JournalDraft;
    type Patch = JournalPatch;

    const TABLE: &'static str = "journal_entries";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &JournalDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            mood: draft.mood,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &JournalPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
    }

    /// An entry needs a title or some content
    fn validate_draft(draft: &JournalDraft) -> Result<(), ValidationError> {
        if draft.title.trim().is_empty() && draft.content.trim().is_empty() {
            return Err(ValidationError::missing_field("title or content"));
        }
        Ok(())
    }
}
