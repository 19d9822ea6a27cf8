//! Focus timer sessions

use crate::models::{Record, RecordId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task label recorded when a session was not attached to anything
pub const FREE_SESSION_LABEL: &str = "Session libre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusMode {
    Focus,
    Short,
    Long,
}

impl FocusMode {
    /// Timer length in minutes
    pub fn minutes(&self) -> u32 {
        match self {
            FocusMode::Focus => 25,
            FocusMode::Short => 5,
            FocusMode::Long => 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: RecordId,
    /// Minutes
    pub duration: u32,
    pub mode: FocusMode,
    #[serde(default)]
    pub task: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusDraft {
    pub duration: u32,
    pub mode: FocusMode,
    pub task: Option<String>,
}

impl FocusDraft {
    /// A completed session of the mode's full length
    pub fn completed(mode: FocusMode, task: Option<String>) -> Self {
        Self {
            duration: mode.minutes(),
            mode,
            task,
        }
    }

    /// Completed session whose label falls back to [`FREE_SESSION_LABEL`]
    /// when `task` is blank
    pub fn labelled(mode: FocusMode, task: &str) -> Self {
        let task = match task.trim() {
            "" => FREE_SESSION_LABEL,
            task => task,
        };
        Self::completed(mode, Some(task.to_string()))
    }
}

impl Record for FocusSession {
    type Draft = FocusDraft;
    type Patch = ();

    const TABLE: &'static str = "focus_sessions";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &FocusDraft) -> Self {
        Self {
            id,
            duration: draft.duration,
            mode: draft.mode,
            task: draft.task.clone(),
            created_at,
        }
    }

    fn apply_patch(&mut self, _patch: &()) {}

    fn validate_draft(draft: &FocusDraft) -> Result<(), ValidationError> {
        if draft.duration == 0 {
            return Err(ValidationError::invalid_value("duration must be at least one minute"));
        }
        Ok(())
    }
}
