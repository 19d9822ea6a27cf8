//! Optimistic Record Store
//!
//! A `RecordStore<R>` owns the canonical in-memory [`Collection`] of one table
//! and is the only place that collection is ever mutated.
//!
//! # Architecture
//!
//! Each store runs a single actor task fed by one FIFO queue. Everything that
//! changes the collection goes through that queue:
//!
//! - user mutations (`insert_optimistic`, `update_optimistic`, `delete_optimistic`,
//!   `update_all`, `clear`) - applied immediately, then written remotely
//! - remote completions - spawned remote calls post their result back to the queue
//! - realtime pushes - forwarded by the notification feed
//! - loads - the latest request wins, older results are discarded
//!
//! Commands are applied strictly in arrival order, so optimistic mutations
//! take effect in the order the user issued them while their confirmations
//! may resolve in any order without interfering with unrelated records.
//!
//! Snapshots are published on a `watch` channel after every change; outcomes
//! and failures are broadcast as [`StoreEvent`]s.
//!
//! # Loads and In-Flight Writes
//!
//! A load's rows may have been read before a concurrent insert or push
//! reached the server. When the load is applied, temporary records whose
//! insert is still pending and server rows received while the load was
//! running are placed back on top of the fetched rows.
//!
//! # Failure Handling
//!
//! See [`reconcile`](crate::engine::reconcile): failed inserts drop the
//! temporary record, failed updates and deletes trigger a full reload, failed
//! bulk writes are only surfaced.

use crate::db::{RemoteTable, SelectQuery, StoreError};
use crate::engine::reconcile::{recovery_for, ConfirmOutcome, Recovery, WriteOp};
use crate::engine::{Collection, StoreEvent, SyncError};
use crate::models::{next_temp_id, Record, RecordId};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, warn};

/// What became of a `load()` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched rows replaced the collection
    Applied { count: usize },
    /// A later load was issued before this one completed; its result was discarded
    Superseded,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum number of records kept (and fetched); `None` for unbounded
    pub capacity: Option<usize>,
    /// Buffer of the store event broadcast channel
    pub event_buffer: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            capacity: None,
            event_buffer: 64,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, SyncError>>;

enum Command<R: Record> {
    Load {
        reply: Option<Reply<LoadOutcome>>,
    },
    LoadFinished {
        request: u64,
        result: Result<Vec<R>, StoreError>,
    },
    Insert {
        temp_id: RecordId,
        draft: R::Draft,
        reply: Reply<RecordId>,
    },
    InsertFinished {
        temp_id: RecordId,
        result: Result<R, StoreError>,
    },
    Update {
        id: RecordId,
        patch: R::Patch,
        reply: Reply<()>,
    },
    Delete {
        id: RecordId,
        reply: Reply<()>,
    },
    UpdateAll {
        patch: R::Patch,
        reply: Reply<()>,
    },
    Clear {
        reply: Reply<()>,
    },
    WriteFinished {
        op: WriteOp,
        id: Option<RecordId>,
        result: Result<(), StoreError>,
    },
    Push(R),
    WaitIdle(oneshot::Sender<()>),
}

/// Handle to a record store; cheap to clone
///
/// The actor task lives as long as any handle (or any in-flight remote call)
/// does.
pub struct RecordStore<R: Record> {
    commands: mpsc::UnboundedSender<Command<R>>,
    snapshots: watch::Receiver<Arc<Collection<R>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl<R: Record> Clone for RecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            snapshots: self.snapshots.clone(),
            events: self.events.clone(),
        }
    }
}

impl<R: Record> RecordStore<R> {
    /// Create an unbounded store over `table`
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime (the actor task is spawned).
    pub fn new(table: Arc<dyn RemoteTable<R>>) -> Self {
        Self::with_options(table, StoreOptions::default())
    }

    pub fn with_options(table: Arc<dyn RemoteTable<R>>, options: StoreOptions) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let initial = Arc::new(Collection::new(options.capacity));
        let (snapshot_tx, snapshots) = watch::channel(Arc::clone(&initial));
        let (events, _) = broadcast::channel(options.event_buffer.max(1));

        let actor = StoreActor {
            table,
            current: initial,
            snapshots: snapshot_tx,
            events: events.clone(),
            inbox,
            loopback: commands.downgrade(),
            capacity: options.capacity,
            latest_load: 0,
            loading: false,
            load_replies: HashMap::new(),
            pending_inserts: HashMap::new(),
            arrived_during_load: Vec::new(),
            in_flight: 0,
            idle_waiters: Vec::new(),
        };
        tokio::spawn(actor.run());

        Self {
            commands,
            snapshots,
            events,
        }
    }

    pub fn table_name(&self) -> &'static str {
        R::TABLE
    }

    /// Replace the collection with a full remote fetch
    ///
    /// On failure the collection is left untouched and `FetchFailure` is
    /// returned. When another load is issued before this one completes, this
    /// one resolves to [`LoadOutcome::Superseded`] and its rows are discarded.
    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Load { reply: Some(reply) })?;
        self.await_reply(response).await
    }

    /// Fire-and-forget variant of [`load`](Self::load)
    pub fn reload(&self) -> Result<(), SyncError> {
        self.send(Command::Load { reply: None })
    }

    /// Insert a record locally under a temporary id, then persist it
    ///
    /// Returns the temporary id once the record is visible in the snapshot;
    /// the remote insert completes in the background and is reconciled
    /// through `confirm_insert` / `reject_insert`.
    ///
    /// # Errors
    ///
    /// `ValidationFailure` when the draft is rejected; nothing is changed
    /// and the remote table is never called.
    pub async fn insert_optimistic(&self, draft: R::Draft) -> Result<RecordId, SyncError> {
        R::validate_draft(&draft)?;
        let temp_id = next_temp_id();
        let (reply, response) = oneshot::channel();
        self.send(Command::Insert {
            temp_id,
            draft,
            reply,
        })?;
        self.await_reply(response).await
    }

    /// Patch a record locally, then persist; a remote failure triggers a reload
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` when the id is not in the collection
    /// - `PendingInsert` when the record still has a temporary id
    pub async fn update_optimistic(&self, id: RecordId, patch: R::Patch) -> Result<(), SyncError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Update { id, patch, reply })?;
        self.await_reply(response).await
    }

    /// Remove a record locally, then delete it remotely; a remote failure
    /// triggers a reload
    pub async fn delete_optimistic(&self, id: RecordId) -> Result<(), SyncError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Delete { id, reply })?;
        self.await_reply(response).await
    }

    /// Patch every record locally, then issue one bulk remote update
    ///
    /// Not rolled back on failure; the error is only broadcast.
    pub async fn update_all(&self, patch: R::Patch) -> Result<(), SyncError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::UpdateAll { patch, reply })?;
        self.await_reply(response).await
    }

    /// Empty the collection locally, then issue one bulk remote delete
    pub async fn clear(&self) -> Result<(), SyncError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Clear { reply })?;
        self.await_reply(response).await
    }

    /// Queue a row received from the realtime channel
    ///
    /// Rows whose id is already present are ignored.
    pub fn push_insert(&self, record: R) -> Result<(), SyncError> {
        self.send(Command::Push(record))
    }

    /// Current collection
    pub fn snapshot(&self) -> Arc<Collection<R>> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified on every new snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<Collection<R>>> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Wait until every queued command is applied and no remote call is
    /// outstanding (including reloads triggered by failures)
    pub async fn wait_idle(&self) {
        let (waiter, idle) = oneshot::channel();
        if self.commands.send(Command::WaitIdle(waiter)).is_ok() {
            let _ = idle.await;
        }
    }

    fn send(&self, command: Command<R>) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .map_err(|_| SyncError::engine_stopped(R::TABLE))
    }

    async fn await_reply<T>(
        &self,
        response: oneshot::Receiver<Result<T, SyncError>>,
    ) -> Result<T, SyncError> {
        response
            .await
            .map_err(|_| SyncError::engine_stopped(R::TABLE))?
    }
}

struct StoreActor<R: Record> {
    table: Arc<dyn RemoteTable<R>>,
    current: Arc<Collection<R>>,
    snapshots: watch::Sender<Arc<Collection<R>>>,
    events: broadcast::Sender<StoreEvent>,
    inbox: mpsc::UnboundedReceiver<Command<R>>,
    /// Weak so that dropping every handle stops the actor
    loopback: mpsc::WeakUnboundedSender<Command<R>>,
    capacity: Option<usize>,
    latest_load: u64,
    /// Set while the latest load has not resolved
    loading: bool,
    load_replies: HashMap<u64, Reply<LoadOutcome>>,
    /// Optimistic records whose remote insert has not resolved
    pending_inserts: HashMap<RecordId, R>,
    /// Server rows confirmed or pushed since the latest load started
    arrived_during_load: Vec<R>,
    in_flight: usize,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl<R: Record> StoreActor<R> {
    async fn run(mut self) {
        debug!("Record store for {} started", R::TABLE);
        while let Some(command) = self.inbox.recv().await {
            self.handle(command);
        }
        debug!("Record store for {} stopped", R::TABLE);
    }

    fn handle(&mut self, command: Command<R>) {
        match command {
            Command::Load { reply } => self.start_load(reply),
            Command::LoadFinished { request, result } => {
                self.finish_load(request, result);
                self.settle();
            }
            Command::Insert {
                temp_id,
                draft,
                reply,
            } => self.insert(temp_id, draft, reply),
            Command::InsertFinished { temp_id, result } => {
                self.finish_insert(temp_id, result);
                self.settle();
            }
            Command::Update { id, patch, reply } => self.update(id, patch, reply),
            Command::Delete { id, reply } => self.delete(id, reply),
            Command::UpdateAll { patch, reply } => self.update_all(patch, reply),
            Command::Clear { reply } => self.clear(reply),
            Command::WriteFinished { op, id, result } => {
                match result {
                    Ok(()) => self.emit(StoreEvent::WriteConfirmed {
                        table: R::TABLE,
                        op,
                        id,
                    }),
                    Err(error) => self.recover(op, id, error),
                }
                self.settle();
            }
            Command::Push(record) => self.apply_push(record),
            Command::WaitIdle(waiter) => {
                if self.in_flight == 0 {
                    let _ = waiter.send(());
                } else {
                    self.idle_waiters.push(waiter);
                }
            }
        }
    }

    fn start_load(&mut self, reply: Option<Reply<LoadOutcome>>) {
        self.latest_load += 1;
        self.loading = true;
        self.arrived_during_load.clear();
        let request = self.latest_load;
        if let Some(reply) = reply {
            self.load_replies.insert(request, reply);
        }

        let mut query = SelectQuery::ordered(R::ORDER);
        if let Some(capacity) = self.capacity {
            query = query.with_limit(capacity);
        }

        debug!("Loading {} (request {})", R::TABLE, request);
        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.select(&query).await;
            Command::LoadFinished { request, result }
        });
    }

    fn finish_load(&mut self, request: u64, result: Result<Vec<R>, StoreError>) {
        let reply = self.load_replies.remove(&request);

        if request != self.latest_load {
            debug!(
                "Discarding superseded load {} of {} (latest is {})",
                request,
                R::TABLE,
                self.latest_load
            );
            if let Some(reply) = reply {
                let _ = reply.send(Ok(LoadOutcome::Superseded));
            }
            return;
        }

        self.loading = false;
        let arrived = std::mem::take(&mut self.arrived_during_load);

        let outcome = match result {
            Ok(rows) => {
                let mut next = self.current.successor(rows);
                let mut kept = 0;
                for record in arrived.into_iter().chain(self.pending_inserts.values().cloned()) {
                    if next.insert(record) {
                        kept += 1;
                    }
                }
                if kept > 0 {
                    debug!("Kept {} in-flight record(s) on top of {} load", kept, R::TABLE);
                }
                let count = next.len();
                self.publish(Arc::new(next));
                debug!("Loaded {} record(s) into {}", count, R::TABLE);
                self.emit(StoreEvent::Loaded {
                    table: R::TABLE,
                    count,
                });
                Ok(LoadOutcome::Applied { count })
            }
            Err(error) => {
                warn!("Failed to load {}: {}", R::TABLE, error);
                self.emit(StoreEvent::LoadFailed {
                    table: R::TABLE,
                    error: error.clone(),
                });
                Err(SyncError::fetch_failure(R::TABLE, error))
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn insert(&mut self, temp_id: RecordId, draft: R::Draft, reply: Reply<RecordId>) {
        let record = R::materialize(temp_id, Utc::now(), &draft);
        self.pending_inserts.insert(temp_id, record.clone());
        self.mutate(|collection| collection.insert(record));
        debug!("Optimistic insert {} into {}", temp_id, R::TABLE);
        let _ = reply.send(Ok(temp_id));

        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.insert(draft).await;
            Command::InsertFinished { temp_id, result }
        });
    }

    fn finish_insert(&mut self, temp_id: RecordId, result: Result<R, StoreError>) {
        // Absent when a clear dropped the record before the insert resolved
        let tracked = self.pending_inserts.remove(&temp_id).is_some();

        match result {
            Ok(server) => {
                let id = server.id();
                if self.loading && tracked {
                    self.arrived_during_load.push(server.clone());
                }
                let restore = tracked.then(|| server.clone());
                let outcome = self.mutate(|collection| collection.confirm_insert(temp_id, server));
                match outcome {
                    ConfirmOutcome::Replaced { moved } => {
                        debug!("Confirmed {} as {} in {} (moved: {})", temp_id, id, R::TABLE, moved)
                    }
                    ConfirmOutcome::Deduplicated => debug!(
                        "Confirmed {} as {} in {}; server row already present",
                        temp_id,
                        id,
                        R::TABLE
                    ),
                    ConfirmOutcome::Orphaned => match restore {
                        Some(server) => {
                            if self.mutate(|collection| collection.insert(server)) {
                                debug!(
                                    "Temporary {} was gone from {}; added server row {}",
                                    temp_id,
                                    R::TABLE,
                                    id
                                );
                            }
                        }
                        None => debug!(
                            "Confirmation of {} in {} arrived after the collection was cleared",
                            temp_id,
                            R::TABLE
                        ),
                    },
                }
                self.emit(StoreEvent::InsertConfirmed {
                    table: R::TABLE,
                    temp_id,
                    id,
                });
            }
            Err(error) => self.recover(WriteOp::Insert, Some(temp_id), error),
        }
    }

    fn update(&mut self, id: RecordId, patch: R::Patch, reply: Reply<()>) {
        let remote_id = match self.remote_id(id) {
            Ok(remote_id) => remote_id,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        self.mutate(|collection| collection.patch(id, &patch));
        for record in self.arrived_during_load.iter_mut().filter(|record| record.id() == id) {
            record.apply_patch(&patch);
        }
        let _ = reply.send(Ok(()));

        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.update(remote_id, patch).await;
            Command::WriteFinished {
                op: WriteOp::Update,
                id: Some(id),
                result,
            }
        });
    }

    fn delete(&mut self, id: RecordId, reply: Reply<()>) {
        let remote_id = match self.remote_id(id) {
            Ok(remote_id) => remote_id,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        self.mutate(|collection| collection.remove(id));
        self.arrived_during_load.retain(|record| record.id() != id);
        let _ = reply.send(Ok(()));

        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.delete(remote_id).await;
            Command::WriteFinished {
                op: WriteOp::Delete,
                id: Some(id),
                result,
            }
        });
    }

    fn update_all(&mut self, patch: R::Patch, reply: Reply<()>) {
        self.mutate(|collection| collection.patch_all(&patch));
        for record in self
            .arrived_during_load
            .iter_mut()
            .chain(self.pending_inserts.values_mut())
        {
            record.apply_patch(&patch);
        }
        let _ = reply.send(Ok(()));

        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.update_all(patch).await;
            Command::WriteFinished {
                op: WriteOp::UpdateAll,
                id: None,
                result,
            }
        });
    }

    fn clear(&mut self, reply: Reply<()>) {
        self.mutate(|collection| collection.clear());
        self.pending_inserts.clear();
        self.arrived_during_load.clear();
        let _ = reply.send(Ok(()));

        let table = Arc::clone(&self.table);
        self.spawn_remote(async move {
            let result = table.delete_all().await;
            Command::WriteFinished {
                op: WriteOp::DeleteAll,
                id: None,
                result,
            }
        });
    }

    fn apply_push(&mut self, record: R) {
        let id = record.id();
        if self.loading {
            self.arrived_during_load.push(record.clone());
        }
        if self.current.contains(id) {
            debug!("Ignoring pushed {} already present in {}", id, R::TABLE);
            return;
        }
        self.mutate(|collection| collection.insert(record));
        self.emit(StoreEvent::PushReceived {
            table: R::TABLE,
            id,
        });
    }

    /// Apply the recovery policy for a failed remote write
    fn recover(&mut self, op: WriteOp, id: Option<RecordId>, error: StoreError) {
        warn!("Remote {} on {} failed: {}", op, R::TABLE, error);

        match recovery_for(op) {
            Recovery::RejectInsert => {
                if let Some(temp_id) = id {
                    self.mutate(|collection| collection.reject_insert(temp_id));
                    self.emit(StoreEvent::InsertRejected {
                        table: R::TABLE,
                        temp_id,
                        error,
                    });
                }
            }
            Recovery::Reload => {
                self.emit(StoreEvent::WriteFailed {
                    table: R::TABLE,
                    op,
                    id,
                    error,
                });
                self.start_load(None);
            }
            Recovery::SurfaceOnly => {
                self.emit(StoreEvent::WriteFailed {
                    table: R::TABLE,
                    op,
                    id,
                    error,
                });
            }
        }
    }

    /// Server id of a record that may be written remotely
    fn remote_id(&self, id: RecordId) -> Result<i64, SyncError> {
        if !self.current.contains(id) {
            return Err(SyncError::record_not_found(R::TABLE, id));
        }
        id.persisted()
            .ok_or_else(|| SyncError::pending_insert(R::TABLE, id))
    }

    fn mutate<T>(&mut self, change: impl FnOnce(&mut Collection<R>) -> T) -> T {
        let result = change(Arc::make_mut(&mut self.current));
        self.snapshots.send_replace(Arc::clone(&self.current));
        result
    }

    fn publish(&mut self, next: Arc<Collection<R>>) {
        self.current = next;
        self.snapshots.send_replace(Arc::clone(&self.current));
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Run a remote call off the actor; its result comes back through the queue
    fn spawn_remote<F>(&mut self, call: F)
    where
        F: Future<Output = Command<R>> + Send + 'static,
    {
        let Some(loopback) = self.loopback.upgrade() else {
            debug!("Record store for {} is shutting down, remote call skipped", R::TABLE);
            return;
        };
        self.in_flight += 1;
        tokio::spawn(async move {
            let command = call.await;
            let _ = loopback.send(command);
        });
    }

    /// Account for a finished remote call and release idle waiters
    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            for waiter in self.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryTable, TableOp};
    use crate::models::{Task, TaskDraft, TaskPriority};

    #[tokio::test]
    async fn test_optimistic_insert_is_visible_before_confirmation() {
        let table = Arc::new(InMemoryTable::<Task>::new());
        let store = RecordStore::new(table.clone());

        let temp_id = store
            .insert_optimistic(TaskDraft::new("Call the bank", TaskPriority::High))
            .await
            .unwrap();

        assert!(temp_id.is_temp());
        assert_eq!(store.snapshot().len(), 1);

        store.wait_idle().await;
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains(temp_id));
        assert_eq!(snapshot.ids(), vec![RecordId::Persisted(1)]);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_the_table() {
        let table = Arc::new(InMemoryTable::<Task>::new());
        let store = RecordStore::new(table.clone());

        let result = store
            .insert_optimistic(TaskDraft::new("  ", TaskPriority::Low))
            .await;

        assert!(matches!(result, Err(SyncError::ValidationFailure(_))));
        store.wait_idle().await;
        assert!(store.snapshot().is_empty());
        assert!(table.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_of_unknown_record_is_rejected_up_front() {
        let table = Arc::new(InMemoryTable::<Task>::new());
        let store = RecordStore::new(table.clone());

        let result = store
            .update_optimistic(RecordId::Persisted(99), Default::default())
            .await;

        assert_eq!(
            result,
            Err(SyncError::record_not_found("tasks", RecordId::Persisted(99)))
        );
        assert!(!table.calls().await.contains(&TableOp::Update));
    }
}
