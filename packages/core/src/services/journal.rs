//! Journal service

use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, SyncError};
use crate::models::{JournalDraft, JournalEntry, Record, RecordId};
use std::sync::Arc;

pub struct Journal {
    store: RecordStore<JournalEntry>,
}

impl Journal {
    pub fn new(table: Arc<dyn RemoteTable<JournalEntry>>) -> Self {
        Self {
            store: RecordStore::new(table),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Edit the entry `id`, or create a new one
    ///
    /// An entry needs a title or some content.
    pub async fn save(&self, id: Option<RecordId>, draft: JournalDraft) -> Result<RecordId, SyncError> {
        match id {
            Some(id) => {
                JournalEntry::validate_draft(&draft)?;
                self.store.update_optimistic(id, draft.to_patch()).await?;
                Ok(id)
            }
            None => self.store.insert_optimistic(draft).await,
        }
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.store.delete_optimistic(id).await
    }

    /// Entries, newest first
    pub fn entries(&self) -> Arc<Collection<JournalEntry>> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &RecordStore<JournalEntry> {
        &self.store
    }
}
