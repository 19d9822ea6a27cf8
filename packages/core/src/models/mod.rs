//! Data Models
//!
//! This module contains the records managed by the sync engine:
//!
//! - [`Record`] / [`RecordId`] - identity, ordering and patch contract shared by all records
//! - Domain records: tasks, transactions, inventory items, goals and milestones,
//!   habits and habit logs, journal entries, focus sessions, calendar events,
//!   notifications
//!
//! Each record comes with a `Draft` (user-supplied creation fields) and a
//! `Patch` (sparse update) type.

mod event;
mod focus;
mod goal;
mod habit;
mod inventory;
mod journal;
mod notification;
mod record;
mod task;
mod transaction;
mod validation;

pub use event::{CalendarEvent, EventDraft, EventKind, DEFAULT_TIME_RANGE};
pub use focus::{FocusDraft, FocusMode, FocusSession, FREE_SESSION_LABEL};
pub use goal::{Goal, GoalCategory, GoalDraft, GoalPatch, Milestone, MilestoneDraft, MilestonePatch};
pub use habit::{Habit, HabitDraft, HabitLog, HabitLogDraft, HabitPatch};
pub use inventory::{InventoryDraft, InventoryItem, InventoryPatch};
pub use journal::{JournalDraft, JournalEntry, JournalPatch, Mood};
pub use notification::{Notification, NotificationDraft, NotificationKind, NotificationPatch};
pub use record::{next_temp_id, Record, RecordId, SortOrder};
pub use task::{Task, TaskDraft, TaskFilter, TaskPatch, TaskPriority};
pub use transaction::{Category, Transaction, TransactionDraft, TransactionKind, TransactionPatch};
pub use validation::ValidationError;
