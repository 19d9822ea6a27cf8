//! Realtime Notification Feed
//!
//! Keeps the most recent notifications in a bounded, newest-first record
//! store and follows the table's push channel.
//!
//! # Push Handling
//!
//! The feed subscribes to inserts *before* its initial load, then forwards
//! every pushed row into the store's mutation queue. The store ignores rows
//! whose id is already present, which covers the echo of the feed's own
//! inserts racing their confirmation.

use crate::config::EngineConfig;
use crate::db::{PushChannel, PushEventKind, PushSubscription, RemoteTable};
use crate::engine::{Collection, LoadOutcome, RecordStore, StoreOptions, SyncError};
use crate::models::{Notification, NotificationDraft, NotificationKind, NotificationPatch, RecordId};
use crate::services::Notifier;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::StreamExt;

pub struct NotificationFeed {
    store: RecordStore<Notification>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationFeed {
    /// Subscribe to pushed notifications and load the most recent ones
    ///
    /// # Errors
    ///
    /// `FetchFailure` when the initial load fails; the subscription is
    /// released in that case.
    pub async fn start(
        table: Arc<dyn RemoteTable<Notification>>,
        channel: &PushChannel<Notification>,
        config: &EngineConfig,
    ) -> Result<Self, SyncError> {
        let store = RecordStore::with_options(
            table,
            StoreOptions {
                capacity: Some(config.feed_capacity),
                event_buffer: config.event_buffer,
            },
        );

        let subscription = channel.subscribe(PushEventKind::Insert);
        let forwarder = tokio::spawn(forward_pushes(subscription, store.clone()));

        if let Err(error) = store.load().await {
            forwarder.abort();
            return Err(error);
        }

        tracing::info!(
            "Notification feed started with {} notification(s)",
            store.snapshot().len()
        );
        Ok(Self {
            store,
            forwarder: Mutex::new(Some(forwarder)),
        })
    }

    pub fn notifications(&self) -> Arc<Collection<Notification>> {
        self.store.snapshot()
    }

    pub fn unread_count(&self) -> usize {
        crate::aggregates::unread_count(self.store.snapshot().iter())
    }

    pub fn store(&self) -> &RecordStore<Notification> {
        &self.store
    }

    pub async fn reload(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Optimistically add a notification
    pub async fn push(&self, message: &str, kind: NotificationKind) -> Result<RecordId, SyncError> {
        self.store
            .insert_optimistic(NotificationDraft::new(message, kind))
            .await
    }

    /// Mark everything read locally, then in one bulk remote update
    pub async fn mark_all_read(&self) -> Result<(), SyncError> {
        self.store
            .update_all(NotificationPatch { read: Some(true) })
            .await
    }

    pub async fn clear(&self) -> Result<(), SyncError> {
        self.store.clear().await
    }

    /// Stop following the push channel
    ///
    /// The loaded notifications stay available; calling it twice is a no-op.
    pub fn teardown(&self) {
        let forwarder = self
            .forwarder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(forwarder) = forwarder {
            forwarder.abort();
            tracing::debug!("Notification feed unsubscribed");
        }
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[async_trait]
impl Notifier for NotificationFeed {
    async fn notify(&self, message: &str, kind: NotificationKind) {
        if let Err(error) = self.push(message, kind).await {
            tracing::warn!("Failed to add notification '{}': {}", message, error);
        }
    }
}

async fn forward_pushes(subscription: PushSubscription<Notification>, store: RecordStore<Notification>) {
    let mut pushes = subscription.into_stream();
    while let Some(item) = pushes.next().await {
        match item {
            Ok(notification) => {
                if store.push_insert(notification).is_err() {
                    break;
                }
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Notification feed lagged, {} push(es) skipped", skipped);
            }
        }
    }
    tracing::debug!("Notification push forwarder stopped");
}
