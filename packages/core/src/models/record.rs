//! Record Identity and the Record Trait
//!
//! Every domain entity handled by the sync engine implements [`Record`]. The
//! trait describes how a record is identified, how it is ordered inside a
//! collection, how a local optimistic copy is materialized from a draft, and
//! how a sparse patch is applied to it.
//!
//! # Identifiers
//!
//! Records created locally carry a [`RecordId::Temp`] until the remote store
//! assigns a [`RecordId::Persisted`] id. The two namespaces are distinct enum
//! variants, so a temporary id can never be mistaken for a server id even
//! when the numeric values coincide.

use crate::models::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Identifier of a record inside a collection
///
/// Serialized as a plain number for persisted ids (matching the remote
/// table's `id` column) and as `"tmp-<n>"` for temporary ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "RawRecordId", try_from = "RawRecordId")]
pub enum RecordId {
    /// Client-generated id, valid only until the server confirms the insert
    Temp(u64),
    /// Server-assigned id
    Persisted(i64),
}

impl RecordId {
    pub fn is_temp(&self) -> bool {
        matches!(self, RecordId::Temp(_))
    }

    /// Server id, or `None` for a record still awaiting confirmation
    pub fn persisted(&self) -> Option<i64> {
        match self {
            RecordId::Persisted(id) => Some(*id),
            RecordId::Temp(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Temp(id) => write!(f, "tmp-{}", id),
            RecordId::Persisted(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Persisted(id)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Number(i64),
    Text(String),
}

impl From<RecordId> for RawRecordId {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Persisted(id) => RawRecordId::Number(id),
            RecordId::Temp(_) => RawRecordId::Text(id.to_string()),
        }
    }
}

impl TryFrom<RawRecordId> for RecordId {
    type Error = String;

    fn try_from(raw: RawRecordId) -> Result<Self, Self::Error> {
        match raw {
            RawRecordId::Number(id) => Ok(RecordId::Persisted(id)),
            RawRecordId::Text(text) => {
                if let Some(value) = text.strip_prefix("tmp-") {
                    value
                        .parse::<u64>()
                        .map(RecordId::Temp)
                        .map_err(|e| format!("Invalid temporary id '{}': {}", text, e))
                } else {
                    text.parse::<i64>()
                        .map(RecordId::Persisted)
                        .map_err(|e| format!("Invalid record id '{}': {}", text, e))
                }
            }
        }
    }
}

static LAST_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh temporary id
///
/// Ids are time-based (wall clock milliseconds) and strictly increasing for
/// the lifetime of the process, so two calls in the same millisecond still
/// yield distinct values and an id is never handed out twice.
pub fn next_temp_id() -> RecordId {
    let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let previous = LAST_TEMP_ID
        .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |last| {
            Some(now_ms.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    RecordId::Temp(now_ms.max(previous + 1))
}

/// Display order of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Descending by [`Record::sort_time`] (feeds, ledgers, task lists)
    NewestFirst,
    /// Ascending by [`Record::sort_time`] (calendars, habit grids, milestones)
    OldestFirst,
    /// Ascending by name, case-insensitive (inventory listings)
    NameAscending,
}

impl SortOrder {
    /// Compare two records according to this order
    ///
    /// Records that compare `Equal` keep their relative position (all sorts
    /// in the engine are stable).
    pub fn compare<R: Record>(&self, a: &R, b: &R) -> Ordering {
        match self {
            SortOrder::NewestFirst => b.sort_time().cmp(&a.sort_time()),
            SortOrder::OldestFirst => a.sort_time().cmp(&b.sort_time()),
            SortOrder::NameAscending => {
                let left = a.sort_name().chars().flat_map(char::to_lowercase);
                let right = b.sort_name().chars().flat_map(char::to_lowercase);
                left.cmp(right)
            }
        }
    }
}

/// A domain entity managed by a [`RecordStore`](crate::engine::RecordStore)
///
/// # Associated Types
///
/// - `Draft` - fields supplied by the user when creating a record
/// - `Patch` - sparse update applied to an existing record
pub trait Record: Clone + Debug + Send + Sync + 'static {
    type Draft: Clone + Debug + Send + Sync + 'static;
    type Patch: Clone + Debug + Send + Sync + 'static;

    /// Remote table name (used for logging and push subscriptions)
    const TABLE: &'static str;

    /// Display order of collections of this record type
    const ORDER: SortOrder = SortOrder::NewestFirst;

    fn id(&self) -> RecordId;

    fn created_at(&self) -> DateTime<Utc>;

    /// Instant used by the time-based orders; the creation time unless the
    /// record is scheduled
    fn sort_time(&self) -> DateTime<Utc> {
        self.created_at()
    }

    /// Name used by [`SortOrder::NameAscending`]
    fn sort_name(&self) -> &str {
        ""
    }

    /// Build the local optimistic copy of a draft
    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &Self::Draft) -> Self;

    /// Apply a sparse patch in place
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Caller-side validation, run before any optimistic mutation
    fn validate_draft(_draft: &Self::Draft) -> Result<(), ValidationError> {
        Ok(())
    }
}
