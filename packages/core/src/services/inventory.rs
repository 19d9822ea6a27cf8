//! Inventory service

use crate::aggregates::{low_stock_count, search, stock_value};
use crate::config::Preferences;
use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, SyncError};
use crate::models::{InventoryDraft, InventoryItem, Record, RecordId};
use std::sync::Arc;

pub struct Inventory {
    store: RecordStore<InventoryItem>,
}

impl Inventory {
    pub fn new(table: Arc<dyn RemoteTable<InventoryItem>>) -> Self {
        Self {
            store: RecordStore::new(table),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Update the item `id` with every draft field, or insert a new one
    ///
    /// Returns the id the item is known under afterwards.
    pub async fn save(&self, id: Option<RecordId>, draft: InventoryDraft) -> Result<RecordId, SyncError> {
        match id {
            Some(id) => {
                InventoryItem::validate_draft(&draft)?;
                self.store.update_optimistic(id, draft.to_patch()).await?;
                Ok(id)
            }
            None => self.store.insert_optimistic(draft).await,
        }
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.store.delete_optimistic(id).await
    }

    /// Items ordered by name
    pub fn items(&self) -> Arc<Collection<InventoryItem>> {
        self.store.snapshot()
    }

    pub fn stock_value(&self) -> f64 {
        stock_value(self.store.snapshot().iter())
    }

    /// Stock value formatted in the user's currency
    pub fn formatted_stock_value(&self, preferences: &Preferences) -> String {
        preferences.format_money(self.stock_value())
    }

    pub fn low_stock_count(&self) -> usize {
        low_stock_count(self.store.snapshot().iter())
    }

    pub fn search(&self, term: &str) -> Vec<InventoryItem> {
        search(self.store.snapshot().iter(), term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn store(&self) -> &RecordStore<InventoryItem> {
        &self.store
    }
}
