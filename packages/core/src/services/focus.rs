//! Focus timer service
//!
//! Records finished timer sessions and reports the day's focus time. Break
//! sessions are stored too but never counted.

use crate::aggregates::{focus_stats_on, FocusStats};
use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, SyncError};
use crate::models::{FocusDraft, FocusMode, FocusSession, RecordId};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

pub struct FocusTimer {
    store: RecordStore<FocusSession>,
}

impl FocusTimer {
    pub fn new(table: Arc<dyn RemoteTable<FocusSession>>) -> Self {
        Self {
            store: RecordStore::new(table),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Save a finished session of `mode`'s full length
    ///
    /// A blank `task` is stored as a free session.
    pub async fn save_session(&self, mode: FocusMode, task: &str) -> Result<RecordId, SyncError> {
        let draft = FocusDraft::labelled(mode, task);
        debug!("Saving {} minute {:?} session", draft.duration, mode);
        self.store.insert_optimistic(draft).await
    }

    /// Focus sessions and minutes of `day`, counting unconfirmed sessions
    pub fn stats_on(&self, day: NaiveDate) -> FocusStats {
        focus_stats_on(self.store.snapshot().iter(), day)
    }

    /// Sessions, newest first
    pub fn sessions(&self) -> Arc<Collection<FocusSession>> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &RecordStore<FocusSession> {
        &self.store
    }
}
