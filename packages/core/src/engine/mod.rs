//! Sync Engine
//!
//! The optimistic mutation / reconciliation machinery shared by every module:
//!
//! - [`Collection`] - ordered, id-unique snapshot of one table
//! - [`RecordStore`] - actor owning a collection; applies optimistic
//!   mutations, issues remote writes and reconciles their outcomes
//! - [`reconcile`] - recovery policy per failed operation
//! - [`StoreEvent`] / [`SyncError`] - surfaced outcomes and failures

mod collection;
mod error;
mod events;
pub mod reconcile;
mod record_store;

pub use collection::Collection;
pub use error::SyncError;
pub use events::StoreEvent;
pub use reconcile::{ConfirmOutcome, Recovery, WriteOp};
pub use record_store::{LoadOutcome, RecordStore, StoreOptions};
