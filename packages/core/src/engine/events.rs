//! Store Events
//!
//! Every record store broadcasts what happened to its collection, so views
//! and services can surface errors or react to confirmations without polling.
//! Events are emitted after the collection snapshot has been published.

use crate::db::StoreError;
use crate::engine::reconcile::WriteOp;
use crate::engine::SyncError;
use crate::models::RecordId;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A load replaced the collection
    Loaded { table: &'static str, count: usize },

    /// A load failed; the collection was left untouched
    LoadFailed {
        table: &'static str,
        error: StoreError,
    },

    /// An optimistic insert was confirmed by the server
    InsertConfirmed {
        table: &'static str,
        temp_id: RecordId,
        id: RecordId,
    },

    /// An optimistic insert failed and the temporary record was removed
    InsertRejected {
        table: &'static str,
        temp_id: RecordId,
        error: StoreError,
    },

    /// A remote update/delete (single or bulk) was accepted by the server
    WriteConfirmed {
        table: &'static str,
        op: WriteOp,
        id: Option<RecordId>,
    },

    /// A remote update/delete (single or bulk) failed
    WriteFailed {
        table: &'static str,
        op: WriteOp,
        id: Option<RecordId>,
        error: StoreError,
    },

    /// A row pushed by the realtime channel was added
    PushReceived { table: &'static str, id: RecordId },
}

impl StoreEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::Loaded { .. } => "store:loaded",
            StoreEvent::LoadFailed { .. } => "store:load-failed",
            StoreEvent::InsertConfirmed { .. } => "store:insert-confirmed",
            StoreEvent::InsertRejected { .. } => "store:insert-rejected",
            StoreEvent::WriteConfirmed { .. } => "store:write-confirmed",
            StoreEvent::WriteFailed { .. } => "store:write-failed",
            StoreEvent::PushReceived { .. } => "store:push-received",
        }
    }

    /// The failure carried by this event, if any
    pub fn error(&self) -> Option<SyncError> {
        match self {
            StoreEvent::LoadFailed { table, error } => {
                Some(SyncError::fetch_failure(*table, error.clone()))
            }
            StoreEvent::InsertRejected { table, error, .. } => Some(SyncError::write_failure(
                *table,
                WriteOp::Insert,
                error.clone(),
            )),
            StoreEvent::WriteFailed {
                table, op, error, ..
            } => Some(SyncError::write_failure(*table, *op, error.clone())),
            _ => None,
        }
    }
}
