//! Notifier Port
//!
//! Services report user-visible outcomes ("task added", "error while
//! creating") through an injected [`Notifier`] instead of a global context.
//! The [`NotificationFeed`](crate::feed::NotificationFeed) is the production
//! implementation; tests plug in their own.

use crate::engine::StoreEvent;
use crate::models::NotificationKind;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to the user; failures are logged, never returned
    async fn notify(&self, message: &str, kind: NotificationKind);
}

/// Notifier that only logs, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str, kind: NotificationKind) {
        tracing::info!("[{:?}] {}", kind, message);
    }
}

/// Background task turning store events into notifications; aborted on drop
pub(crate) struct OutcomeNotifier {
    task: JoinHandle<()>,
}

impl Drop for OutcomeNotifier {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn an [`OutcomeNotifier`] over a store's events
///
/// `describe` picks the events worth a message. The task also ends on its own
/// once the store is gone.
pub(crate) fn spawn_outcome_notifier<F>(
    mut events: broadcast::Receiver<StoreEvent>,
    notifier: Arc<dyn Notifier>,
    describe: F,
) -> OutcomeNotifier
where
    F: Fn(&StoreEvent) -> Option<(&'static str, NotificationKind)> + Send + 'static,
{
    let task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some((message, kind)) = describe(&event) {
                        notifier.notify(message, kind).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Outcome notifier lagged, {} event(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    OutcomeNotifier { task }
}
