//! In-Memory Remote Table
//!
//! A [`RemoteTable`] backed by a `Vec` behind a tokio `RwLock`. It assigns
//! sequential server ids and server timestamps exactly like the hosted table,
//! optionally echoes inserts on a [`PushChannel`], and lets callers inject
//! failures for the next call of a given operation.

use crate::db::{PushChannel, PushEventKind, RemoteTable, SelectQuery, StoreError};
use crate::models::{Record, RecordId};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Operation kinds, used for failure injection and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOp {
    Select,
    Insert,
    Update,
    Delete,
    UpdateAll,
    DeleteAll,
}

pub struct InMemoryTable<R: Record> {
    rows: RwLock<Vec<R>>,
    next_id: AtomicI64,
    pending_failures: Mutex<Vec<TableOp>>,
    calls: Mutex<Vec<TableOp>>,
    push: Option<PushChannel<R>>,
}

impl<R: Record> Default for InMemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryTable<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            pending_failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            push: None,
        }
    }

    /// Publish every successful insert on `channel`
    pub fn with_push(mut self, channel: PushChannel<R>) -> Self {
        self.push = Some(channel);
        self
    }

    /// Replace the table contents; the next assigned id follows the highest seeded id
    pub async fn seed(&self, rows: Vec<R>) {
        let max_id = rows
            .iter()
            .filter_map(|row| row.id().persisted())
            .max()
            .unwrap_or(0);
        self.next_id.store(max_id + 1, Ordering::SeqCst);
        *self.rows.write().await = rows;
    }

    pub async fn rows(&self) -> Vec<R> {
        self.rows.read().await.clone()
    }

    /// Make the next call of `op` fail with a transport error
    pub async fn fail_next(&self, op: TableOp) {
        self.pending_failures.lock().await.push(op);
    }

    /// Operations received so far, in call order
    pub async fn calls(&self) -> Vec<TableOp> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, op: TableOp) -> Result<(), StoreError> {
        self.calls.lock().await.push(op);

        let mut failures = self.pending_failures.lock().await;
        if let Some(index) = failures.iter().position(|pending| *pending == op) {
            failures.remove(index);
            debug!("Injected {:?} failure on {}", op, R::TABLE);
            return Err(StoreError::transport(
                R::TABLE,
                format!("injected {:?} failure", op),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RemoteTable<R> for InMemoryTable<R> {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<R>, StoreError> {
        self.enter(TableOp::Select).await?;

        let mut rows: Vec<R> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| match query.created_after {
                Some(instant) => row.created_at() >= instant,
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.order.compare(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, draft: R::Draft) -> Result<R, StoreError> {
        self.enter(TableOp::Insert).await?;

        R::validate_draft(&draft).map_err(|e| StoreError::rejected(R::TABLE, e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = R::materialize(RecordId::Persisted(id), Utc::now(), &draft);
        self.rows.write().await.push(row.clone());

        if let Some(channel) = &self.push {
            channel.publish(PushEventKind::Insert, row.clone());
        }
        Ok(row)
    }

    async fn update(&self, id: i64, patch: R::Patch) -> Result<(), StoreError> {
        self.enter(TableOp::Update).await?;

        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id() == RecordId::Persisted(id))
            .ok_or_else(|| StoreError::not_found(R::TABLE, id))?;
        row.apply_patch(&patch);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.enter(TableOp::Delete).await?;

        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != RecordId::Persisted(id));
        if rows.len() == before {
            return Err(StoreError::not_found(R::TABLE, id));
        }
        Ok(())
    }

    async fn update_all(&self, patch: R::Patch) -> Result<(), StoreError> {
        self.enter(TableOp::UpdateAll).await?;

        for row in self.rows.write().await.iter_mut() {
            row.apply_patch(&patch);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.enter(TableOp::DeleteAll).await?;

        self.rows.write().await.clear();
        Ok(())
    }
}
