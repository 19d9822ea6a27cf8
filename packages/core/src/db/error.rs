//! Remote Store Error Types
//!
//! Errors reported by a [`RemoteTable`](super::RemoteTable) implementation.
//! The engine maps them into [`SyncError`](crate::engine::SyncError) according
//! to the operation that failed.

use thiserror::Error;

/// Remote table operation errors
///
/// Cloneable so a failure can be carried by broadcast store events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Network or service failure; the operation may not have been applied
    #[error("Transport error on {table}: {message}")]
    Transport { table: String, message: String },

    /// The remote store refused the row (constraint or validation failure)
    #[error("Rejected by {table}: {reason}")]
    Rejected { table: String, reason: String },

    /// No row with this id
    #[error("Row {id} not found in {table}")]
    NotFound { table: String, id: i64 },
}

impl StoreError {
    /// Create a transport error
    pub fn transport(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a rejected-row error
    pub fn rejected(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(table: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            table: table.into(),
            id,
        }
    }
}
