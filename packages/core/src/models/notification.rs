//! Notifications shown in the realtime feed
//!
//! Field names follow the remote `notifications` table (`type`, `is_read`).

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(rename = "is_read", default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl NotificationDraft {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPatch {
    #[serde(rename = "is_read", skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

impl Record for Notification {
    type Draft = NotificationDraft;
    type Patch = NotificationPatch;

    const TABLE: &'static str = "notifications";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &NotificationDraft) -> Self {
        Self {
            id,
            message: draft.message.clone(),
            kind: draft.kind,
            read: false,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &NotificationPatch) {
        if let Some(read) = patch.read {
            self.read = read;
        }
    }

    fn validate_draft(draft: &NotificationDraft) -> Result<(), ValidationError> {
        require_text("message", &draft.message)
    }
}
