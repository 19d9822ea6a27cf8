//! RemoteTable Trait - Remote Store Abstraction
//!
//! Mirrors the per-table operations of the hosted relational database:
//! filtered/ordered selects, single-row insert returning the stored row,
//! update and delete by id, and the bulk update/delete used by the
//! notification feed.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every call is a network round trip
//! 2. **Server-Computed Fields**: `insert` returns the stored row, carrying the
//!    permanent id and the server `created_at`
//! 3. **Persisted Ids Only**: `update`/`delete` take the server id; temporary
//!    ids never leave the engine

use crate::db::StoreError;
use crate::models::{Record, SortOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter and ordering of a `select`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub order: SortOrder,
    /// Keep only the first `limit` rows after ordering
    pub limit: Option<usize>,
    /// Keep only rows created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
}

impl SelectQuery {
    pub fn ordered(order: SortOrder) -> Self {
        Self {
            order,
            limit: None,
            created_after: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }
}

/// Remote table holding rows of one record type
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; record stores call them from
/// spawned tasks.
#[async_trait]
pub trait RemoteTable<R: Record>: Send + Sync {
    /// Fetch rows matching `query`, in `query.order`
    async fn select(&self, query: &SelectQuery) -> Result<Vec<R>, StoreError>;

    /// Insert one row and return it as stored (server id, server timestamps)
    async fn insert(&self, draft: R::Draft) -> Result<R, StoreError>;

    /// Apply a sparse update to the row with this id
    async fn update(&self, id: i64, patch: R::Patch) -> Result<(), StoreError>;

    /// Delete the row with this id
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Apply the same sparse update to every row
    async fn update_all(&self, patch: R::Patch) -> Result<(), StoreError>;

    /// Delete every row
    async fn delete_all(&self) -> Result<(), StoreError>;
}
