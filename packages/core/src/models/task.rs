//! Task records
//!
//! Tasks are listed newest first. A task is created incomplete with the
//! default tag and toggled between active and completed.

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEFAULT_TAG: &str = "Général";

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" | "high" => Ok(Self::High),
            "MEDIUM" | "medium" => Ok(Self::Medium),
            "LOW" | "low" => Ok(Self::Low),
            _ => Err(format!("Invalid task priority: {}", s)),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub text: String,
    pub priority: TaskPriority,
    pub completed: bool,
    pub tag: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub text: String,
    pub priority: TaskPriority,
    pub tag: String,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            text: text.into(),
            priority,
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }
}

impl Record for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const TABLE: &'static str = "tasks";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &TaskDraft) -> Self {
        Self {
            id,
            text: draft.text.trim().to_string(),
            priority: draft.priority,
            completed: false,
            tag: draft.tag.clone(),
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    fn validate_draft(draft: &TaskDraft) -> Result<(), ValidationError> {
        require_text("text", &draft.text)
    }
}

/// View filter of the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_trims_text_and_starts_incomplete() {
        let draft = TaskDraft::new("  Write report ", TaskPriority::High);
        let task = Task::materialize(RecordId::Temp(1), Utc::now(), &draft);

        assert_eq!(task.text, "Write report");
        assert!(!task.completed);
        assert_eq!(task.tag, "Général");
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let draft = TaskDraft::new("   ", TaskPriority::Low);
        assert_eq!(
            Task::validate_draft(&draft),
            Err(ValidationError::MissingField("text".to_string()))
        );
    }

    #[test]
    fn test_filter_matches() {
        let mut task = Task::materialize(
            RecordId::Persisted(1),
            Utc::now(),
            &TaskDraft::new("Read", TaskPriority::Medium),
        );
        assert!(TaskFilter::Active.matches(&task));
        assert!(!TaskFilter::Completed.matches(&task));

        task.apply_patch(&TaskPatch::completed(true));
        assert!(TaskFilter::Completed.matches(&task));
        assert!(TaskFilter::All.matches(&task));
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert_eq!("low".parse::<TaskPriority>().unwrap(), TaskPriority::Low);
        assert!("URGENT".parse::<TaskPriority>().is_err());
    }
}
