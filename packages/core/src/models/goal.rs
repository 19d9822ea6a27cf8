//! Goals and their milestones
//!
//! A milestone belongs to exactly one persisted goal. Goal progress is derived
//! from the milestone collection (see [`crate::aggregates::goal_progress`]).

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, SortOrder, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalCategory {
    Academic,
    Finance,
    Spiritual,
    #[default]
    Personal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub category: GoalCategory,
    /// Free-form target ("June", "En cours", ...)
    #[serde(default)]
    pub deadline: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub title: String,
    pub category: GoalCategory,
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<String>>,
}

impl Record for Goal {
    type Draft = GoalDraft;
    type Patch = GoalPatch;

    const TABLE: &'static str = "goals";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &GoalDraft) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            category: draft.category,
            deadline: draft.deadline.clone(),
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &GoalPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(deadline) = &patch.deadline {
            self.deadline = deadline.clone();
        }
    }

    fn validate_draft(draft: &GoalDraft) -> Result<(), ValidationError> {
        require_text("title", &draft.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: RecordId,
    pub goal_id: i64,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDraft {
    pub goal_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestonePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl Record for Milestone {
    type Draft = MilestoneDraft;
    type Patch = MilestonePatch;

    const TABLE: &'static str = "goal_milestones";
    const ORDER: SortOrder = SortOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &MilestoneDraft) -> Self {
        Self {
            id,
            goal_id: draft.goal_id,
            text: draft.text.trim().to_string(),
            done: false,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &MilestonePatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
    }

    fn validate_draft(draft: &MilestoneDraft) -> Result<(), ValidationError> {
        require_text("text", &draft.text)
    }
}
