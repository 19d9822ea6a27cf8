//! Remote Store Layer
//!
//! This module describes the collaborators the sync engine consumes:
//!
//! - [`RemoteTable`] - per-domain table port (`select`, `insert`, `update`, `delete`
//!   and their bulk forms), implemented by the hosted database client
//! - [`PushChannel`] - realtime channel delivering rows inserted remotely
//! - [`InMemoryTable`] - in-process backend used for local development and tests,
//!   with failure injection and optional push echo
//!
//! # Architecture
//!
//! Record stores never talk to a database directly; they hold an
//! `Arc<dyn RemoteTable<R>>`. Swapping the hosted backend for the in-memory
//! one requires no change in the engine or the services.

mod error;
mod memory_table;
mod push;
mod remote_table;

pub use error::StoreError;
pub use memory_table::{InMemoryTable, TableOp};
pub use push::{PushChannel, PushEventKind, PushSubscription};
pub use remote_table::{RemoteTable, SelectQuery};
