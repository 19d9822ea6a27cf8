//! Calendar service

use crate::aggregates::{event_days_in_month, events_on};
use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, SyncError};
use crate::models::{CalendarEvent, EventDraft, RecordId};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Calendar {
    store: RecordStore<CalendarEvent>,
}

impl Calendar {
    pub fn new(table: Arc<dyn RemoteTable<CalendarEvent>>) -> Self {
        Self {
            store: RecordStore::new(table),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Schedule an event; a blank title is rejected before anything changes
    pub async fn add(&self, draft: EventDraft) -> Result<RecordId, SyncError> {
        self.store.insert_optimistic(draft).await
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.store.delete_optimistic(id).await
    }

    /// All events, earliest scheduled first
    pub fn events(&self) -> Arc<Collection<CalendarEvent>> {
        self.store.snapshot()
    }

    pub fn events_on(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        events_on(self.store.snapshot().iter(), day)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Days of the month to mark on the month grid
    pub fn busy_days(&self, year: i32, month: u32) -> BTreeSet<u32> {
        event_days_in_month(self.store.snapshot().iter(), year, month)
    }

    pub fn store(&self) -> &RecordStore<CalendarEvent> {
        &self.store
    }
}
