//! Record Store Integration Tests
//!
//! Exercise the optimistic mutation / reconciliation cycle end to end against
//! the in-memory remote table:
//!
//! - load ordering and id uniqueness
//! - insert confirmation and rejection
//! - corrective reload after failed updates and deletes
//! - bulk failures surfaced without rollback
//! - superseded loads
//! - up-front rejections (validation, unknown ids, unconfirmed inserts)

#[cfg(test)]
mod record_store_tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use lifeos_core::db::{InMemoryTable, RemoteTable, SelectQuery, StoreError, TableOp};
    use lifeos_core::engine::{StoreOptions, WriteOp};
    use lifeos_core::{
        LoadOutcome, RecordId, RecordStore, StoreEvent, SyncError, Task, TaskDraft, TaskPatch,
        TaskPriority,
    };
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::{broadcast, oneshot, Mutex};
    use tokio::time::timeout;

    const WAIT: std::time::Duration = std::time::Duration::from_secs(5);

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn task(id: i64, text: &str, minutes: i64) -> Task {
        Task {
            id: RecordId::Persisted(id),
            text: text.to_string(),
            priority: TaskPriority::Medium,
            completed: false,
            tag: "Général".to_string(),
            created_at: at(minutes),
        }
    }

    fn drain(events: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    async fn seeded_store(rows: Vec<Task>) -> Result<(Arc<InMemoryTable<Task>>, RecordStore<Task>)> {
        let table = Arc::new(InMemoryTable::<Task>::new());
        table.seed(rows).await;
        let store = RecordStore::new(table.clone());
        store.load().await?;
        Ok((table, store))
    }

    /// Remote table whose selects and inserts resolve only when the test says so
    ///
    /// Gates are consumed in call order; calls without a gate go straight to
    /// the in-memory table.
    struct GatedTable {
        selects: Mutex<VecDeque<oneshot::Receiver<Vec<Task>>>>,
        inserts: Mutex<VecDeque<oneshot::Receiver<()>>>,
        select_calls: AtomicUsize,
        inner: InMemoryTable<Task>,
    }

    impl GatedTable {
        fn new() -> Self {
            Self {
                selects: Mutex::new(VecDeque::new()),
                inserts: Mutex::new(VecDeque::new()),
                select_calls: AtomicUsize::new(0),
                inner: InMemoryTable::new(),
            }
        }

        /// The next insert waits until the returned sender fires (or forever
        /// while it is kept alive)
        async fn gate_insert(&self) -> oneshot::Sender<()> {
            let (release, gate) = oneshot::channel();
            self.inserts.lock().await.push_back(gate);
            release
        }

        async fn gate_select(&self) -> oneshot::Sender<Vec<Task>> {
            let (release, gate) = oneshot::channel();
            self.selects.lock().await.push_back(gate);
            release
        }

        async fn wait_for_selects(&self, count: usize) {
            while self.select_calls.load(Ordering::SeqCst) < count {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl RemoteTable<Task> for GatedTable {
        async fn select(&self, query: &SelectQuery) -> Result<Vec<Task>, StoreError> {
            let gate = self.selects.lock().await.pop_front();
            self.select_calls.fetch_add(1, Ordering::SeqCst);
            match gate {
                Some(gate) => gate
                    .await
                    .map_err(|_| StoreError::transport("tasks", "gate dropped")),
                None => self.inner.select(query).await,
            }
        }

        async fn insert(&self, draft: TaskDraft) -> Result<Task, StoreError> {
            let gate = self.inserts.lock().await.pop_front();
            if let Some(gate) = gate {
                gate.await
                    .map_err(|_| StoreError::transport("tasks", "insert gate dropped"))?;
            }
            self.inner.insert(draft).await
        }

        async fn update(&self, id: i64, patch: TaskPatch) -> Result<(), StoreError> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }

        async fn update_all(&self, patch: TaskPatch) -> Result<(), StoreError> {
            self.inner.update_all(patch).await
        }

        async fn delete_all(&self) -> Result<(), StoreError> {
            self.inner.delete_all().await
        }
    }

    #[tokio::test]
    async fn test_load_orders_newest_first_with_unique_ids() -> Result<()> {
        let (_table, store) = seeded_store(vec![
            task(1, "oldest", 0),
            task(3, "newest", 30),
            task(2, "middle", 10),
            task(3, "newest again", 30),
        ])
        .await?;

        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.ids(),
            vec![
                RecordId::Persisted(3),
                RecordId::Persisted(2),
                RecordId::Persisted(1)
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_is_confirmed_with_server_id() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "existing", 0)]).await?;
        let mut events = store.subscribe_events();

        let temp_id = store
            .insert_optimistic(TaskDraft::new("Prepare exam", TaskPriority::High))
            .await?;
        assert!(temp_id.is_temp());
        assert_eq!(store.snapshot().len(), 2);

        timeout(WAIT, store.wait_idle()).await?;

        let snapshot = store.snapshot();
        assert!(!snapshot.contains(temp_id));
        assert_eq!(
            snapshot.ids().iter().filter(|id| **id == RecordId::Persisted(2)).count(),
            1
        );
        assert_eq!(snapshot.as_slice()[0].text, "Prepare exam");
        assert_eq!(table.rows().await.len(), 2);

        assert_eq!(
            drain(&mut events),
            vec![StoreEvent::InsertConfirmed {
                table: "tasks",
                temp_id,
                id: RecordId::Persisted(2),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_insert_restores_previous_collection() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "a", 0), task(2, "b", 5)]).await?;
        let before = store.snapshot().as_slice().to_vec();
        let mut events = store.subscribe_events();

        table.fail_next(TableOp::Insert).await;
        let temp_id = store
            .insert_optimistic(TaskDraft::new("doomed", TaskPriority::Low))
            .await?;
        timeout(WAIT, store.wait_idle()).await?;

        assert_eq!(store.snapshot().as_slice(), before.as_slice());
        let drained = drain(&mut events);
        assert_eq!(drained.len(), 1);
        assert!(matches!(
            &drained[0],
            StoreEvent::InsertRejected { temp_id: rejected, .. } if *rejected == temp_id
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_reloads_server_state() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "Call the bank", 0)]).await?;
        let mut events = store.subscribe_events();
        let id = RecordId::Persisted(1);

        table.fail_next(TableOp::Update).await;
        store.update_optimistic(id, TaskPatch::completed(true)).await?;
        assert!(store.snapshot().get(id).unwrap().completed);

        timeout(WAIT, store.wait_idle()).await?;

        assert!(!store.snapshot().get(id).unwrap().completed);
        assert_eq!(
            table.calls().await,
            vec![TableOp::Select, TableOp::Update, TableOp::Select]
        );

        let drained = drain(&mut events);
        assert!(matches!(
            &drained[0],
            StoreEvent::WriteFailed { op: WriteOp::Update, id: Some(failed), .. } if *failed == id
        ));
        assert!(matches!(&drained[1], StoreEvent::Loaded { count: 1, .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_delete_brings_record_back() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "keep me", 0), task(2, "other", 1)]).await?;

        table.fail_next(TableOp::Delete).await;
        store.delete_optimistic(RecordId::Persisted(1)).await?;
        assert!(!store.snapshot().contains(RecordId::Persisted(1)));

        timeout(WAIT, store.wait_idle()).await?;

        assert!(store.snapshot().contains(RecordId::Persisted(1)));
        assert_eq!(store.snapshot().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_bulk_update_is_only_surfaced() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "a", 0), task(2, "b", 1)]).await?;
        let mut events = store.subscribe_events();

        table.fail_next(TableOp::UpdateAll).await;
        store.update_all(TaskPatch::completed(true)).await?;
        timeout(WAIT, store.wait_idle()).await?;

        assert!(store.snapshot().iter().all(|t| t.completed));
        assert!(table.rows().await.iter().all(|t| !t.completed));
        assert_eq!(
            table.calls().await,
            vec![TableOp::Select, TableOp::UpdateAll]
        );

        let drained = drain(&mut events);
        assert_eq!(drained.len(), 1);
        assert_eq!(
            drained[0].error(),
            Some(SyncError::write_failure(
                "tasks",
                WriteOp::UpdateAll,
                StoreError::transport("tasks", "injected UpdateAll failure"),
            ))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_empties_local_and_remote() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "a", 0), task(2, "b", 1)]).await?;

        store.clear().await?;
        assert!(store.snapshot().is_empty());

        timeout(WAIT, store.wait_idle()).await?;
        assert!(table.rows().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_load_leaves_collection_untouched() -> Result<()> {
        let (table, store) = seeded_store(vec![task(1, "a", 0)]).await?;
        let version = store.snapshot().version();

        table.fail_next(TableOp::Select).await;
        let result = store.load().await;

        assert!(matches!(result, Err(SyncError::FetchFailure { .. })));
        assert_eq!(store.snapshot().version(), version);
        assert_eq!(store.snapshot().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_superseded_load_is_discarded() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let release_first = table.gate_select().await;
        let release_second = table.gate_select().await;
        let store = RecordStore::new(table.clone());

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.load().await }
        });
        timeout(WAIT, table.wait_for_selects(1)).await?;

        let second = tokio::spawn({
            let store = store.clone();
            async move { store.load().await }
        });
        timeout(WAIT, table.wait_for_selects(2)).await?;

        release_second
            .send(vec![task(2, "fresh", 10)])
            .map_err(|_| anyhow::anyhow!("second load gone"))?;
        assert_eq!(timeout(WAIT, second).await???, LoadOutcome::Applied { count: 1 });

        release_first
            .send(vec![task(1, "stale", 0), task(3, "stale too", 5)])
            .map_err(|_| anyhow::anyhow!("first load gone"))?;
        assert_eq!(timeout(WAIT, first).await???, LoadOutcome::Superseded);

        timeout(WAIT, store.wait_idle()).await?;
        assert_eq!(store.snapshot().ids(), vec![RecordId::Persisted(2)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_of_unconfirmed_insert_is_rejected() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let _held = table.gate_insert().await;
        let store = RecordStore::new(table.clone());

        let temp_id = store
            .insert_optimistic(TaskDraft::new("waiting", TaskPriority::Medium))
            .await?;

        let update = store
            .update_optimistic(temp_id, TaskPatch::completed(true))
            .await;
        assert_eq!(update, Err(SyncError::pending_insert("tasks", temp_id)));

        let delete = store.delete_optimistic(temp_id).await;
        assert_eq!(delete, Err(SyncError::pending_insert("tasks", temp_id)));

        assert!(!store.snapshot().get(temp_id).unwrap().completed);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_text_never_reaches_the_store() -> Result<()> {
        let (table, store) = seeded_store(vec![]).await?;
        let version = store.snapshot().version();

        let result = store
            .insert_optimistic(TaskDraft::new("   ", TaskPriority::High))
            .await;

        assert!(matches!(result, Err(SyncError::ValidationFailure(_))));
        assert!(result.unwrap_err().is_rejected_up_front());
        assert_eq!(store.snapshot().version(), version);
        assert_eq!(table.calls().await, vec![TableOp::Select]);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_of_known_id_is_ignored() -> Result<()> {
        let (_table, store) = seeded_store(vec![task(1, "a", 0)]).await?;
        let version = store.snapshot().version();

        store.push_insert(task(1, "a (echo)", 0))?;
        store.push_insert(task(9, "from elsewhere", 60))?;
        timeout(WAIT, store.wait_idle()).await?;

        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.ids(),
            vec![RecordId::Persisted(9), RecordId::Persisted(1)]
        );
        assert_eq!(snapshot.get(RecordId::Persisted(1)).unwrap().text, "a");
        assert_eq!(snapshot.version(), version + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_watchers_see_every_change() -> Result<()> {
        let (_table, store) = seeded_store(vec![]).await?;
        let mut watcher = store.watch();
        watcher.borrow_and_update();

        store
            .insert_optimistic(TaskDraft::new("watched", TaskPriority::Low))
            .await?;

        timeout(WAIT, watcher.changed()).await??;
        assert!(!watcher.borrow_and_update().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_ids_unique_and_sorted() -> Result<()> {
        let table = Arc::new(InMemoryTable::<Task>::new());
        let store = RecordStore::with_options(
            table.clone(),
            StoreOptions {
                capacity: None,
                event_buffer: 256,
            },
        );

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_optimistic(TaskDraft::new(format!("task {}", i), TaskPriority::Medium))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await??;
        }
        timeout(WAIT, store.wait_idle()).await?;

        let snapshot = store.snapshot();
        let mut ids = snapshot.ids();
        assert_eq!(ids.len(), 20);
        assert!(ids.iter().all(|id| !id.is_temp()));
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert!(snapshot
            .as_slice()
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        Ok(())
    }

    async fn wait_for_load(events: &mut broadcast::Receiver<StoreEvent>) -> Result<()> {
        loop {
            if let StoreEvent::Loaded { .. } = timeout(WAIT, events.recv()).await?? {
                return Ok(());
            }
        }
    }

    #[tokio::test]
    async fn test_insert_confirmed_after_stale_reload_is_kept() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let release_select = table.gate_select().await;
        let release_insert = table.gate_insert().await;
        let store = RecordStore::new(table.clone());
        let mut events = store.subscribe_events();

        store.reload()?;
        timeout(WAIT, table.wait_for_selects(1)).await?;

        let temp_id = store
            .insert_optimistic(TaskDraft::new("Buy milk", TaskPriority::Medium))
            .await?;

        // The select read the table before the insert reached it
        release_select
            .send(Vec::new())
            .map_err(|_| anyhow::anyhow!("load gone"))?;
        wait_for_load(&mut events).await?;
        assert_eq!(store.snapshot().ids(), vec![temp_id]);

        release_insert
            .send(())
            .map_err(|_| anyhow::anyhow!("insert gone"))?;
        timeout(WAIT, store.wait_idle()).await?;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.ids(), vec![RecordId::Persisted(1)]);
        assert_eq!(snapshot.as_slice()[0].text, "Buy milk");
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_confirmed_while_load_is_pending_is_kept() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let release_select = table.gate_select().await;
        let store = RecordStore::new(table.clone());
        let mut events = store.subscribe_events();

        store.reload()?;
        timeout(WAIT, table.wait_for_selects(1)).await?;

        store
            .insert_optimistic(TaskDraft::new("Water plants", TaskPriority::Low))
            .await?;
        loop {
            if let StoreEvent::InsertConfirmed { .. } = timeout(WAIT, events.recv()).await?? {
                break;
            }
        }

        release_select
            .send(vec![task(7, "older", 0)])
            .map_err(|_| anyhow::anyhow!("load gone"))?;
        timeout(WAIT, store.wait_idle()).await?;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(RecordId::Persisted(1)));
        assert!(snapshot.contains(RecordId::Persisted(7)));
        Ok(())
    }

    #[tokio::test]
    async fn test_push_received_during_load_survives_it() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let release_select = table.gate_select().await;
        let store = RecordStore::new(table.clone());

        let load = tokio::spawn({
            let store = store.clone();
            async move { store.load().await }
        });
        timeout(WAIT, table.wait_for_selects(1)).await?;

        store.push_insert(task(5, "from another device", 20))?;
        release_select
            .send(vec![task(4, "loaded", 10)])
            .map_err(|_| anyhow::anyhow!("load gone"))?;

        assert_eq!(timeout(WAIT, load).await???, LoadOutcome::Applied { count: 2 });
        assert_eq!(
            store.snapshot().ids(),
            vec![RecordId::Persisted(5), RecordId::Persisted(4)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_drops_insert_still_in_flight() -> Result<()> {
        let table = Arc::new(GatedTable::new());
        let release_insert = table.gate_insert().await;
        let store = RecordStore::new(table.clone());

        store
            .insert_optimistic(TaskDraft::new("Short-lived", TaskPriority::Low))
            .await?;
        store.clear().await?;

        release_insert
            .send(())
            .map_err(|_| anyhow::anyhow!("insert gone"))?;
        timeout(WAIT, store.wait_idle()).await?;

        assert!(store.snapshot().is_empty());
        Ok(())
    }
}
