//! Goal board: goals and their milestones

use crate::aggregates::{milestone_counts, MilestoneCounts};
use crate::db::{RemoteTable, StoreError};
use crate::engine::{Collection, RecordStore, StoreEvent, SyncError, WriteOp};
use crate::models::{
    Goal, GoalCategory, GoalDraft, Milestone, MilestoneDraft, MilestonePatch, NotificationKind,
    Record, RecordId,
};
use crate::services::notifier::{spawn_outcome_notifier, OutcomeNotifier};
use crate::services::Notifier;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub struct GoalBoard {
    goals: RecordStore<Goal>,
    milestones: RecordStore<Milestone>,
    notifier: Arc<dyn Notifier>,
    _outcomes: OutcomeNotifier,
}

impl GoalBoard {
    pub fn new(
        goals: Arc<dyn RemoteTable<Goal>>,
        milestones: Arc<dyn RemoteTable<Milestone>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let goals = RecordStore::new(goals);
        let outcomes = spawn_outcome_notifier(
            goals.subscribe_events(),
            Arc::clone(&notifier),
            |event| match event {
                StoreEvent::InsertConfirmed { .. } => Some(("Objectif créé !", NotificationKind::Success)),
                StoreEvent::InsertRejected { .. } => Some(("Erreur création", NotificationKind::Error)),
                _ => None,
            },
        );

        Self {
            goals,
            milestones: RecordStore::new(milestones),
            notifier,
            _outcomes: outcomes,
        }
    }

    /// Load goals and milestones concurrently
    pub async fn load(&self) -> Result<(), SyncError> {
        tokio::try_join!(self.goals.load(), self.milestones.load())?;
        Ok(())
    }

    pub async fn add_goal(
        &self,
        title: &str,
        category: GoalCategory,
        deadline: Option<String>,
    ) -> Result<RecordId, SyncError> {
        self.goals
            .insert_optimistic(GoalDraft {
                title: title.trim().to_string(),
                category,
                deadline,
            })
            .await
    }

    /// Delete a goal, then its milestones once the server accepted the
    /// goal deletion
    ///
    /// # Errors
    ///
    /// `WriteFailure` when the remote delete fails; the goal comes back with
    /// the corrective reload and its milestones are left untouched.
    pub async fn remove_goal(&self, id: RecordId) -> Result<(), SyncError> {
        let mut events = self.goals.subscribe_events();
        self.goals.delete_optimistic(id).await?;
        self.goal_deleted(&mut events, id).await?;

        if let Some(goal_id) = id.persisted() {
            let owned: Vec<RecordId> = self
                .milestones
                .snapshot()
                .iter()
                .filter(|m| m.goal_id == goal_id)
                .map(|m| m.id)
                .collect();
            for milestone in owned {
                if let Err(error) = self.milestones.delete_optimistic(milestone).await {
                    debug!("Milestone {} of goal {} not deleted: {}", milestone, id, error);
                }
            }
        }

        self.notifier
            .notify("Objectif supprimé", NotificationKind::Info)
            .await;
        Ok(())
    }

    /// Attach a milestone to a persisted goal
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` when the goal is unknown
    /// - `PendingInsert` when the goal is not confirmed yet
    pub async fn add_milestone(&self, goal: RecordId, text: &str) -> Result<RecordId, SyncError> {
        let goal_id = self.persisted_goal(goal)?;
        self.milestones
            .insert_optimistic(MilestoneDraft {
                goal_id,
                text: text.trim().to_string(),
            })
            .await
    }

    /// Flip a milestone's done flag; returns the new value
    pub async fn toggle_milestone(&self, id: RecordId) -> Result<bool, SyncError> {
        let done = self
            .milestones
            .snapshot()
            .get(id)
            .map(|m| !m.done)
            .ok_or_else(|| SyncError::record_not_found(Milestone::TABLE, id))?;

        self.milestones
            .update_optimistic(
                id,
                MilestonePatch {
                    done: Some(done),
                    ..Default::default()
                },
            )
            .await?;
        Ok(done)
    }

    pub async fn remove_milestone(&self, id: RecordId) -> Result<(), SyncError> {
        self.milestones.delete_optimistic(id).await
    }

    pub fn goals(&self) -> Arc<Collection<Goal>> {
        self.goals.snapshot()
    }

    /// Milestones of one goal, oldest first
    pub fn milestones_of(&self, goal: RecordId) -> Vec<Milestone> {
        let Some(goal_id) = goal.persisted() else {
            return Vec::new();
        };
        self.milestones
            .snapshot()
            .iter()
            .filter(|m| m.goal_id == goal_id)
            .cloned()
            .collect()
    }

    pub fn counts(&self, goal: RecordId) -> MilestoneCounts {
        match goal.persisted() {
            Some(goal_id) => milestone_counts(self.milestones.snapshot().iter(), goal_id),
            None => MilestoneCounts::default(),
        }
    }

    /// Completion percentage of a goal's milestones
    pub fn progress(&self, goal: RecordId) -> u8 {
        self.counts(goal).percent()
    }

    pub fn goal_store(&self) -> &RecordStore<Goal> {
        &self.goals
    }

    pub fn milestone_store(&self) -> &RecordStore<Milestone> {
        &self.milestones
    }

    /// Wait for the outcome of the remote delete of goal `id`
    async fn goal_deleted(
        &self,
        events: &mut broadcast::Receiver<StoreEvent>,
        id: RecordId,
    ) -> Result<(), SyncError> {
        loop {
            match events.recv().await {
                Ok(StoreEvent::WriteConfirmed {
                    op: WriteOp::Delete,
                    id: Some(deleted),
                    ..
                }) if deleted == id => return Ok(()),
                Ok(StoreEvent::WriteFailed {
                    op: WriteOp::Delete,
                    id: Some(failed),
                    error,
                    ..
                }) if failed == id => {
                    return Err(SyncError::write_failure(Goal::TABLE, WriteOp::Delete, error))
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The outcome may be among the skipped events; settle on the snapshot
                    warn!("Goal events lagged by {}, waiting for the store to settle", skipped);
                    self.goals.wait_idle().await;
                    if self.goals.snapshot().contains(id) {
                        let error = StoreError::transport(Goal::TABLE, "goal came back after delete");
                        return Err(SyncError::write_failure(Goal::TABLE, WriteOp::Delete, error));
                    }
                    return Ok(());
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SyncError::engine_stopped(Goal::TABLE))
                }
            }
        }
    }

    fn persisted_goal(&self, goal: RecordId) -> Result<i64, SyncError> {
        if !self.goals.snapshot().contains(goal) {
            return Err(SyncError::record_not_found(Goal::TABLE, goal));
        }
        goal.persisted()
            .ok_or_else(|| SyncError::pending_insert(Goal::TABLE, goal))
    }
}
