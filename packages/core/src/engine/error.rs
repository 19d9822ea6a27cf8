//! Sync Engine Error Types
//!
//! `SyncError` covers the three failure classes of the engine:
//!
//! - **FetchFailure** - a load failed; the collection is left as it was
//! - **WriteFailure** - a remote write failed after the optimistic change
//!   (recovered locally, see [`reconcile`](super::reconcile))
//! - **ValidationFailure** - caller-side rejection, before any local change
//!
//! plus the engine-level conditions that reject a mutation up front.

use crate::db::StoreError;
use crate::engine::reconcile::WriteOp;
use crate::models::{RecordId, ValidationError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Loading the collection failed
    #[error("Failed to load {table}: {source}")]
    FetchFailure {
        table: &'static str,
        #[source]
        source: StoreError,
    },

    /// A remote write failed after the optimistic change was applied
    #[error("Remote {op} on {table} failed: {source}")]
    WriteFailure {
        table: &'static str,
        op: WriteOp,
        #[source]
        source: StoreError,
    },

    /// Draft rejected before reaching the store
    #[error("Validation failed: {0}")]
    ValidationFailure(#[from] ValidationError),

    /// No record with this id in the local collection
    #[error("Record {id} not found in {table}")]
    RecordNotFound { table: &'static str, id: RecordId },

    /// The record still carries a temporary id; it cannot be written remotely yet
    #[error("Record {id} in {table} is awaiting server confirmation")]
    PendingInsert { table: &'static str, id: RecordId },

    /// The store's actor task is gone
    #[error("Record store for {table} has stopped")]
    EngineStopped { table: &'static str },
}

impl SyncError {
    pub fn fetch_failure(table: &'static str, source: StoreError) -> Self {
        Self::FetchFailure { table, source }
    }

    pub fn write_failure(table: &'static str, op: WriteOp, source: StoreError) -> Self {
        Self::WriteFailure { table, op, source }
    }

    pub fn record_not_found(table: &'static str, id: RecordId) -> Self {
        Self::RecordNotFound { table, id }
    }

    pub fn pending_insert(table: &'static str, id: RecordId) -> Self {
        Self::PendingInsert { table, id }
    }

    pub fn engine_stopped(table: &'static str) -> Self {
        Self::EngineStopped { table }
    }

    /// Whether the error was raised before any local change
    pub fn is_rejected_up_front(&self) -> bool {
        matches!(
            self,
            SyncError::ValidationFailure(_)
                | SyncError::RecordNotFound { .. }
                | SyncError::PendingInsert { .. }
        )
    }
}
