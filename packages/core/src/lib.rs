//! LifeOS Core Sync Engine
//!
//! This crate provides the data layer shared by every LifeOS dashboard module
//! (tasks, ledger, inventory, goals, habits, journal, focus timer, calendar,
//! notifications).
//!
//! # Architecture
//!
//! - **Optimistic Record Stores**: Mutations are applied locally first, then
//!   persisted through a remote table and reconciled with the server result
//! - **Single Mutation Queue**: Each store owns one actor task; user actions,
//!   remote completions and realtime pushes are applied sequentially
//! - **Derived Aggregates**: Balances, progress and stock values are pure
//!   functions of the current collection snapshot, never stored
//! - **Explicit Collaborators**: Services receive their remote tables and
//!   notifier port by injection; there is no ambient global context
//!
//! # Modules
//!
//! - [`models`] - Domain records (Task, Transaction, Notification, etc.)
//! - [`db`] - Remote table port, push channel and in-memory backend
//! - [`engine`] - Collections, record store actor and reconciliation policy
//! - [`aggregates`] - Pure derivations over collection snapshots
//! - [`feed`] - Realtime notification feed adapter
//! - [`services`] - Per-module facades (TaskList, Ledger, Inventory, ...)
//! - [`config`] - Engine configuration and persisted user preferences

pub mod aggregates;
pub mod config;
pub mod db;
pub mod engine;
pub mod feed;
pub mod models;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use engine::{Collection, LoadOutcome, RecordStore, StoreEvent, SyncError};
pub use models::*;
pub use services::*;
