//! Task list service

use crate::aggregates::{filter_tasks, task_counts, TaskCounts};
use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, StoreEvent, SyncError};
use crate::models::{NotificationKind, Record, RecordId, Task, TaskDraft, TaskFilter, TaskPatch, TaskPriority};
use crate::services::notifier::{spawn_outcome_notifier, OutcomeNotifier};
use crate::services::Notifier;
use std::sync::Arc;

pub struct TaskList {
    store: RecordStore<Task>,
    notifier: Arc<dyn Notifier>,
    _outcomes: OutcomeNotifier,
}

impl TaskList {
    pub fn new(table: Arc<dyn RemoteTable<Task>>, notifier: Arc<dyn Notifier>) -> Self {
        let store = RecordStore::new(table);
        let outcomes = spawn_outcome_notifier(
            store.subscribe_events(),
            Arc::clone(&notifier),
            |event| match event {
                StoreEvent::InsertConfirmed { .. } => {
                    Some(("Tâche ajoutée au planning !", NotificationKind::Success))
                }
                StoreEvent::InsertRejected { .. } => {
                    Some(("Erreur lors de l'ajout.", NotificationKind::Error))
                }
                _ => None,
            },
        );

        Self {
            store,
            notifier,
            _outcomes: outcomes,
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Add a task; blank text is rejected before anything changes
    pub async fn add(&self, text: &str, priority: TaskPriority) -> Result<RecordId, SyncError> {
        self.store
            .insert_optimistic(TaskDraft::new(text.trim(), priority))
            .await
    }

    /// Flip the completed flag; returns the new value
    pub async fn toggle(&self, id: RecordId) -> Result<bool, SyncError> {
        let completed = self
            .store
            .snapshot()
            .get(id)
            .map(|task| !task.completed)
            .ok_or_else(|| SyncError::record_not_found(Task::TABLE, id))?;

        self.store
            .update_optimistic(id, TaskPatch::completed(completed))
            .await?;

        if completed {
            self.notifier
                .notify("Tâche terminée. Bravo !", NotificationKind::Success)
                .await;
        }
        Ok(completed)
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.store.delete_optimistic(id).await
    }

    pub fn tasks(&self) -> Arc<Collection<Task>> {
        self.store.snapshot()
    }

    pub fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        filter_tasks(self.store.snapshot().iter(), filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> TaskCounts {
        task_counts(self.store.snapshot().iter())
    }

    pub fn store(&self) -> &RecordStore<Task> {
        &self.store
    }
}
