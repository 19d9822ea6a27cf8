//! Reconciliation Policy
//!
//! Decides how a remote outcome is merged into the optimistic state.
//!
//! | Failed operation       | Recovery                                   |
//! |------------------------|--------------------------------------------|
//! | insert                 | drop the temporary record (`reject_insert`) |
//! | update, delete         | full reload from the remote table          |
//! | bulk update, bulk delete | surface the error, keep local state      |
//!
//! Field-level rollback is never attempted: a reload trades a visible flicker
//! for a collection that is guaranteed to match the server again.

use serde::Serialize;
use std::fmt;

/// Remote write kinds issued by a record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Insert,
    Update,
    Delete,
    UpdateAll,
    DeleteAll,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteOp::Insert => "insert",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
            WriteOp::UpdateAll => "bulk update",
            WriteOp::DeleteAll => "bulk delete",
        };
        f.write_str(name)
    }
}

/// What the store does after a remote write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    RejectInsert,
    Reload,
    SurfaceOnly,
}

pub fn recovery_for(op: WriteOp) -> Recovery {
    match op {
        WriteOp::Insert => Recovery::RejectInsert,
        WriteOp::Update | WriteOp::Delete => Recovery::Reload,
        WriteOp::UpdateAll | WriteOp::DeleteAll => Recovery::SurfaceOnly,
    }
}

/// Result of merging a confirmed insert into a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Temporary record replaced by the server record
    Replaced { moved: bool },
    /// Server id was already present; the temporary record was dropped
    Deduplicated,
    /// Temporary record no longer present (replaced by a reload or cleared)
    Orphaned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_policy() {
        assert_eq!(recovery_for(WriteOp::Insert), Recovery::RejectInsert);
        assert_eq!(recovery_for(WriteOp::Update), Recovery::Reload);
        assert_eq!(recovery_for(WriteOp::Delete), Recovery::Reload);
        assert_eq!(recovery_for(WriteOp::UpdateAll), Recovery::SurfaceOnly);
        assert_eq!(recovery_for(WriteOp::DeleteAll), Recovery::SurfaceOnly);
    }
}
