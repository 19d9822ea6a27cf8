//! Realtime Push Channel
//!
//! Delivers rows inserted in a remote table to every subscriber, the way the
//! hosted database's realtime channel does. Built on tokio's broadcast channel
//! so several consumers can listen to the same table.
//!
//! # Event Flow
//!
//! 1. A row is inserted remotely (by this client or another one)
//! 2. The backend publishes it on the table's `PushChannel`
//! 3. Each `PushSubscription` receives a clone
//! 4. The notification feed forwards it into its record store's queue

use crate::models::Record;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// Kind of change a subscription listens to
///
/// Only inserts are pushed; updates and deletes are observed by reloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEventKind {
    Insert,
}

/// Realtime channel for one table
#[derive(Debug, Clone)]
pub struct PushChannel<R: Record> {
    sender: broadcast::Sender<R>,
}

impl<R: Record> PushChannel<R> {
    /// Create a channel buffering up to `capacity` undelivered rows per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn table(&self) -> &'static str {
        R::TABLE
    }

    /// Publish a row to every current subscriber
    ///
    /// Returns the number of subscribers that will see it (0 when nobody listens).
    pub fn publish(&self, event: PushEventKind, record: R) -> usize {
        match self.sender.send(record) {
            Ok(receivers) => {
                debug!("Pushed {:?} on {} to {} subscriber(s)", event, R::TABLE, receivers);
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, event: PushEventKind) -> PushSubscription<R> {
        debug!("New {:?} subscription on {}", event, R::TABLE);
        PushSubscription {
            event,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of a [`PushChannel`]; dropping it unsubscribes
pub struct PushSubscription<R: Record> {
    event: PushEventKind,
    receiver: broadcast::Receiver<R>,
}

impl<R: Record> PushSubscription<R> {
    pub fn event(&self) -> PushEventKind {
        self.event
    }

    /// Next pushed row, or `None` once the channel is closed
    ///
    /// Rows missed because the subscriber lagged behind are skipped.
    pub async fn recv(&mut self) -> Option<R> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Push subscription on {} lagged, {} event(s) skipped",
                        R::TABLE,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a `Stream` of pushed rows (lag errors surface as items)
    pub fn into_stream(self) -> BroadcastStream<R> {
        BroadcastStream::new(self.receiver)
    }
}
