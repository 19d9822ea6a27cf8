//! Calendar events, listed chronologically by their scheduled date

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, SortOrder, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Time slot proposed for a new event
pub const DEFAULT_TIME_RANGE: &str = "09:00 - 10:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Lectures and exams
    #[default]
    Academic,
    DeepWork,
    Social,
    Deadline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: RecordId,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    /// Scheduled day (stored as an instant)
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub time_range: String,
    #[serde(default)]
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Whether the event is scheduled on `day` (UTC)
    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date.date_naive() == day
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub date: DateTime<Utc>,
    pub time_range: String,
    pub location: String,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, kind: EventKind, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            kind,
            date,
            time_range: DEFAULT_TIME_RANGE.to_string(),
            location: String::new(),
        }
    }

    pub fn with_time_range(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = time_range.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

impl Record for CalendarEvent {
    type Draft = EventDraft;
    type Patch = ();

    const TABLE: &'static str = "events";
    const ORDER: SortOrder = SortOrder::OldestFirst;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sort_time(&self) -> DateTime<Utc> {
        self.date
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &EventDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            kind: draft.kind,
            date: draft.date,
            time_range: draft.time_range.clone(),
            location: draft.location.clone(),
            created_at,
        }
    }

    fn apply_patch(&mut self, _patch: &()) {}

    fn validate_draft(draft: &EventDraft) -> Result<(), ValidationError> {
        require_text("title", &draft.title)
    }
}
