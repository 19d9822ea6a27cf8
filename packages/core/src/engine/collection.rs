//! Ordered Record Collection
//!
//! A [`Collection`] is the in-memory view of one remote table: records kept in
//! the domain's [`SortOrder`], unique by id, optionally capped to a maximum
//! length. Record stores publish collections as immutable `Arc` snapshots;
//! every change produces a new `version`, which serves as the snapshot's
//! identity for memoized aggregates.
//!
//! # Invariants
//!
//! - Ids are unique at every observable instant
//! - Records are sorted by `R::ORDER` (ties keep insertion order)
//! - With a capacity, only the first `capacity` records in display order are
//!   retained (the oldest entries of a newest-first feed are dropped)

use crate::engine::reconcile::ConfirmOutcome;
use crate::models::{Record, RecordId};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Collection<R: Record> {
    records: Vec<R>,
    version: u64,
    capacity: Option<usize>,
}

impl<R: Record> Default for Collection<R> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<R: Record> Collection<R> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            version: 0,
            capacity,
        }
    }

    /// Build a collection from fetched rows
    ///
    /// Rows are sorted by the domain order; a repeated id keeps its first
    /// occurrence.
    pub fn from_rows(rows: Vec<R>, capacity: Option<usize>) -> Self {
        let mut collection = Self::new(capacity);
        collection.replace_all(rows);
        collection
    }

    /// Next snapshot after an authoritative load: same capacity, new rows,
    /// version continuing from this one
    pub(crate) fn successor(&self, rows: Vec<R>) -> Self {
        let mut next = Self {
            records: Vec::new(),
            version: self.version,
            capacity: self.capacity,
        };
        next.replace_all(rows);
        next
    }

    /// Monotonic change counter, the identity of this snapshot
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(Record::id).collect()
    }

    /// Replace every record with `rows` (authoritative load)
    pub fn replace_all(&mut self, rows: Vec<R>) {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut records: Vec<R> = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.insert(row.id()) {
                records.push(row);
            } else {
                warn!("Dropping duplicate row {} loaded from {}", row.id(), R::TABLE);
            }
        }
        records.sort_by(|a, b| R::ORDER.compare(a, b));

        self.records = records;
        self.enforce_capacity();
        self.bump();
    }

    /// Place a record at its sorted position
    ///
    /// Newest-first collections put the record before others with the same
    /// key; ascending collections put it after them. Returns `false` (and
    /// changes nothing) when the id is already present.
    pub fn insert(&mut self, record: R) -> bool {
        if self.contains(record.id()) {
            return false;
        }
        let index = self.sorted_index(&record);
        self.records.insert(index, record);
        self.enforce_capacity();
        self.bump();
        true
    }

    /// Swap the temporary record for the server's copy
    ///
    /// The record keeps its position when its ordering key is unchanged and
    /// is re-sorted otherwise. If the server id is already present (a realtime
    /// echo got there first) the temporary record is dropped instead, so the
    /// server id appears exactly once.
    pub fn confirm_insert(&mut self, temp_id: RecordId, server: R) -> ConfirmOutcome {
        let Some(index) = self.position(temp_id) else {
            return ConfirmOutcome::Orphaned;
        };

        if self.contains(server.id()) {
            self.records.remove(index);
            self.bump();
            return ConfirmOutcome::Deduplicated;
        }

        self.records[index] = server;
        let out_of_order = (index > 0
            && R::ORDER.compare(&self.records[index - 1], &self.records[index])
                == Ordering::Greater)
            || (index + 1 < self.records.len()
                && R::ORDER.compare(&self.records[index], &self.records[index + 1])
                    == Ordering::Greater);

        if out_of_order {
            let record = self.records.remove(index);
            let target = self.sorted_index(&record);
            self.records.insert(target, record);
        }
        self.bump();
        ConfirmOutcome::Replaced {
            moved: out_of_order,
        }
    }

    /// Drop a temporary record whose insert failed
    pub fn reject_insert(&mut self, temp_id: RecordId) -> Option<R> {
        self.remove(temp_id)
    }

    pub fn remove(&mut self, id: RecordId) -> Option<R> {
        let index = self.position(id)?;
        let removed = self.records.remove(index);
        self.bump();
        Some(removed)
    }

    /// Apply a patch to one record; returns `false` when the id is unknown
    ///
    /// A patch may rename a name-ordered record, so the collection is
    /// re-sorted afterwards (stable, so time-ordered collections do not move).
    pub fn patch(&mut self, id: RecordId, patch: &R::Patch) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.records[index].apply_patch(patch);
        self.records.sort_by(|a, b| R::ORDER.compare(a, b));
        self.bump();
        true
    }

    pub fn patch_all(&mut self, patch: &R::Patch) {
        for record in &mut self.records {
            record.apply_patch(patch);
        }
        self.records.sort_by(|a, b| R::ORDER.compare(a, b));
        self.bump();
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.bump();
    }

    fn sorted_index(&self, record: &R) -> usize {
        match R::ORDER {
            crate::models::SortOrder::NewestFirst => self
                .records
                .partition_point(|existing| R::ORDER.compare(existing, record) == Ordering::Less),
            _ => self
                .records
                .partition_point(|existing| R::ORDER.compare(existing, record) != Ordering::Greater),
        }
    }

    fn enforce_capacity(&mut self) {
        if let Some(capacity) = self.capacity {
            self.records.truncate(capacity);
        }
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

impl<'a, R: Record> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        InventoryDraft, InventoryItem, InventoryPatch, Notification, NotificationDraft,
        NotificationKind, Task, TaskDraft, TaskPriority,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn task(id: RecordId, minutes: i64) -> Task {
        Task::materialize(id, at(minutes), &TaskDraft::new("t", TaskPriority::Medium))
    }

    fn item(id: i64, name: &str) -> InventoryItem {
        InventoryItem::materialize(
            RecordId::Persisted(id),
            at(id),
            &InventoryDraft {
                name: name.to_string(),
                category: "Hardware".to_string(),
                quantity: 1,
                unit_value: 1.0,
                min_stock: 0,
            },
        )
    }

    #[test]
    fn test_from_rows_sorts_and_deduplicates() {
        let rows = vec![
            task(RecordId::Persisted(1), 0),
            task(RecordId::Persisted(3), 20),
            task(RecordId::Persisted(2), 10),
            task(RecordId::Persisted(3), 30),
        ];
        let collection = Collection::from_rows(rows, None);

        assert_eq!(
            collection.ids(),
            vec![
                RecordId::Persisted(3),
                RecordId::Persisted(2),
                RecordId::Persisted(1)
            ]
        );
        // first occurrence of id 3 wins
        assert_eq!(collection.get(RecordId::Persisted(3)).unwrap().created_at, at(20));
    }

    #[test]
    fn test_insert_newest_first_prepends() {
        let mut collection =
            Collection::from_rows(vec![task(RecordId::Persisted(1), 0)], None);
        assert!(collection.insert(task(RecordId::Temp(10), 5)));
        assert_eq!(collection.ids()[0], RecordId::Temp(10));
        assert!(!collection.insert(task(RecordId::Temp(10), 6)));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_confirm_replaces_in_place_when_key_unchanged() {
        let mut collection = Collection::from_rows(
            vec![task(RecordId::Persisted(1), 0), task(RecordId::Persisted(2), 10)],
            None,
        );
        collection.insert(task(RecordId::Temp(5), 20));
        let before = collection.version();

        let outcome = collection.confirm_insert(RecordId::Temp(5), task(RecordId::Persisted(3), 20));

        assert_eq!(outcome, ConfirmOutcome::Replaced { moved: false });
        assert_eq!(collection.ids()[0], RecordId::Persisted(3));
        assert!(!collection.contains(RecordId::Temp(5)));
        assert!(collection.version() > before);
    }

    #[test]
    fn test_confirm_resorts_when_server_timestamp_differs() {
        let mut collection = Collection::from_rows(
            vec![task(RecordId::Persisted(1), 0), task(RecordId::Persisted(2), 10)],
            None,
        );
        collection.insert(task(RecordId::Temp(5), 20));

        // server clock places the row between the two existing ones
        let outcome = collection.confirm_insert(RecordId::Temp(5), task(RecordId::Persisted(3), 5));

        assert_eq!(outcome, ConfirmOutcome::Replaced { moved: true });
        assert_eq!(
            collection.ids(),
            vec![
                RecordId::Persisted(2),
                RecordId::Persisted(3),
                RecordId::Persisted(1)
            ]
        );
    }

    #[test]
    fn test_confirm_after_echo_keeps_single_server_id() {
        let mut collection: Collection<Task> = Collection::new(None);
        collection.insert(task(RecordId::Temp(5), 0));
        collection.insert(task(RecordId::Persisted(9), 0));

        let outcome = collection.confirm_insert(RecordId::Temp(5), task(RecordId::Persisted(9), 0));

        assert_eq!(outcome, ConfirmOutcome::Deduplicated);
        assert_eq!(collection.ids(), vec![RecordId::Persisted(9)]);
    }

    #[test]
    fn test_confirm_of_unknown_temp_id_is_orphaned() {
        let mut collection: Collection<Task> = Collection::new(None);
        let outcome = collection.confirm_insert(RecordId::Temp(1), task(RecordId::Persisted(1), 0));
        assert_eq!(outcome, ConfirmOutcome::Orphaned);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_reject_restores_previous_records() {
        let mut collection = Collection::from_rows(
            vec![task(RecordId::Persisted(1), 0), task(RecordId::Persisted(2), 10)],
            None,
        );
        let before = collection.as_slice().to_vec();

        collection.insert(task(RecordId::Temp(5), 20));
        collection.reject_insert(RecordId::Temp(5));

        assert_eq!(collection.as_slice(), before.as_slice());
    }

    #[test]
    fn test_capacity_drops_oldest_of_newest_first_feed() {
        let draft = NotificationDraft::new("hello", NotificationKind::Info);
        let rows: Vec<Notification> = (0..3)
            .map(|i| Notification::materialize(RecordId::Persisted(i), at(i), &draft))
            .collect();
        let mut feed = Collection::from_rows(rows, Some(3));

        feed.insert(Notification::materialize(RecordId::Persisted(10), at(10), &draft));

        assert_eq!(feed.len(), 3);
        assert_eq!(feed.ids()[0], RecordId::Persisted(10));
        assert!(!feed.contains(RecordId::Persisted(0)));
    }

    #[test]
    fn test_name_order_is_case_insensitive_and_resorted_on_rename() {
        let mut inventory = Collection::from_rows(
            vec![item(1, "cable"), item(2, "Adapter"), item(3, "battery")],
            None,
        );
        assert_eq!(
            inventory.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["Adapter", "battery", "cable"]
        );

        inventory.patch(
            RecordId::Persisted(2),
            &InventoryPatch {
                name: Some("Zip ties".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            inventory.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["battery", "cable", "Zip ties"]
        );
    }
}
