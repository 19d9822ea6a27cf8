//! Habit tracker: habits and their daily logs

use crate::aggregates::{habit_week, HabitWeek};
use crate::db::RemoteTable;
use crate::engine::{Collection, RecordStore, StoreEvent, SyncError};
use crate::models::{Habit, HabitDraft, HabitLog, HabitLogDraft, NotificationKind, Record, RecordId};
use crate::services::notifier::{spawn_outcome_notifier, OutcomeNotifier};
use crate::services::Notifier;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct HabitTracker {
    habits: RecordStore<Habit>,
    logs: RecordStore<HabitLog>,
    notifier: Arc<dyn Notifier>,
    _outcomes: OutcomeNotifier,
}

impl HabitTracker {
    pub fn new(
        habits: Arc<dyn RemoteTable<Habit>>,
        logs: Arc<dyn RemoteTable<HabitLog>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let habits = RecordStore::new(habits);
        let outcomes = spawn_outcome_notifier(
            habits.subscribe_events(),
            Arc::clone(&notifier),
            |event| match event {
                StoreEvent::InsertConfirmed { .. } => {
                    Some(("Nouvelle habitude créée !", NotificationKind::Success))
                }
                StoreEvent::InsertRejected { .. } => {
                    Some(("Erreur lors de la création.", NotificationKind::Error))
                }
                _ => None,
            },
        );

        Self {
            habits,
            logs: RecordStore::new(logs),
            notifier,
            _outcomes: outcomes,
        }
    }

    pub async fn load(&self) -> Result<(), SyncError> {
        tokio::try_join!(self.habits.load(), self.logs.load())?;
        Ok(())
    }

    pub async fn create(&self, name: &str, color: Option<String>) -> Result<RecordId, SyncError> {
        self.habits
            .insert_optimistic(HabitDraft::new(name.trim(), color))
            .await
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.habits.delete_optimistic(id).await?;
        self.notifier
            .notify("Habitude supprimée.", NotificationKind::Info)
            .await;
        Ok(())
    }

    /// Log `date` for a habit, or remove the log when it already exists
    ///
    /// Returns whether the day is now marked done.
    pub async fn toggle_day(&self, habit: RecordId, date: NaiveDate) -> Result<bool, SyncError> {
        if !self.habits.snapshot().contains(habit) {
            return Err(SyncError::record_not_found(Habit::TABLE, habit));
        }
        let habit_id = habit
            .persisted()
            .ok_or_else(|| SyncError::pending_insert(Habit::TABLE, habit))?;

        let existing = self
            .logs
            .snapshot()
            .iter()
            .find(|log| log.habit_id == habit_id && log.date == date)
            .map(|log| log.id);

        match existing {
            Some(log) => {
                self.logs.delete_optimistic(log).await?;
                Ok(false)
            }
            None => {
                self.logs
                    .insert_optimistic(HabitLogDraft { habit_id, date })
                    .await?;
                self.notifier
                    .notify("Bien joué ! Continue comme ça.", NotificationKind::Success)
                    .await;
                Ok(true)
            }
        }
    }

    /// Trailing seven days ending on `today`
    pub fn week(&self, habit: RecordId, today: NaiveDate) -> HabitWeek {
        let logs = self.logs.snapshot();
        match habit.persisted() {
            Some(habit_id) => habit_week(habit_id, logs.iter(), today),
            None => habit_week(0, std::iter::empty(), today),
        }
    }

    pub fn habits(&self) -> Arc<Collection<Habit>> {
        self.habits.snapshot()
    }

    pub fn habit_store(&self) -> &RecordStore<Habit> {
        &self.habits
    }

    pub fn log_store(&self) -> &RecordStore<HabitLog> {
        &self.logs
    }
}
