//! Habits and daily habit logs
//!
//! A log marks one habit as done on one local calendar date. Toggling a day
//! inserts or deletes the matching log.

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, SortOrder, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_COLOR: &str = "bg-indigo-500";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: RecordId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub color: String,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            name: name.into(),
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Record for Habit {
    type Draft = HabitDraft;
    type Patch = HabitPatch;

    const TABLE: &'static str = "habits";
    const ORDER: SortOrder = SortOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &HabitDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            color: draft.color.clone(),
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &HabitPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
    }

    fn validate_draft(draft: &HabitDraft) -> Result<(), ValidationError> {
        require_text("name", &draft.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: RecordId,
    pub habit_id: i64,
    /// Local calendar date the habit was done on
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLogDraft {
    pub habit_id: i64,
    pub date: NaiveDate,
}

impl Record for HabitLog {
    type Draft = HabitLogDraft;
    /// Logs are only ever inserted or deleted
    type Patch = ();

    const TABLE: &'static str = "habit_logs";
    const ORDER: SortOrder = SortOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &HabitLogDraft) -> Self {
        Self {
            id,
            habit_id: draft.habit_id,
            date: draft.date,
            created_at,
        }
    }

    fn apply_patch(&mut self, _patch: &()) {}
}
