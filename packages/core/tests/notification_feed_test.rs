//! Notification Feed Integration Tests
//!
//! The feed keeps the 20 most recent notifications and follows the table's
//! push channel. Covered here:
//!
//! - bounded newest-first initial load and unread count
//! - pushes from other clients prepended without a re-fetch
//! - echo of the feed's own inserts deduplicated
//! - mark-all-read and clear, including failed bulk writes
//! - teardown stops following the channel

#[cfg(test)]
mod notification_feed_tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use lifeos_core::config::EngineConfig;
    use lifeos_core::db::{InMemoryTable, PushChannel, RemoteTable, TableOp};
    use lifeos_core::feed::NotificationFeed;
    use lifeos_core::services::Notifier;
    use lifeos_core::{Notification, NotificationDraft, NotificationKind, RecordId};
    use std::sync::Arc;
    use tokio::time::timeout;

    const WAIT: std::time::Duration = std::time::Duration::from_secs(5);

    fn notification(id: i64, minutes: i64, read: bool) -> Notification {
        Notification {
            id: RecordId::Persisted(id),
            message: format!("notification {}", id),
            kind: NotificationKind::Info,
            read,
            created_at: Utc.with_ymd_and_hms(2025, 4, 1, 7, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    async fn start_feed(
        rows: Vec<Notification>,
    ) -> Result<(
        Arc<InMemoryTable<Notification>>,
        PushChannel<Notification>,
        NotificationFeed,
    )> {
        let config = EngineConfig::default();
        let channel = config.push_channel::<Notification>();
        let table = Arc::new(InMemoryTable::<Notification>::new().with_push(channel.clone()));
        table.seed(rows).await;
        let feed = NotificationFeed::start(table.clone(), &channel, &config).await?;
        Ok((table, channel, feed))
    }

    /// Wait until the pushed rows reached the store queue and were applied
    async fn settle(feed: &NotificationFeed) -> Result<()> {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        timeout(WAIT, feed.store().wait_idle()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_start_loads_twenty_most_recent() -> Result<()> {
        let rows: Vec<Notification> = (1..=25)
            .map(|i| notification(i, i, i % 5 == 0))
            .collect();
        let (_table, _channel, feed) = start_feed(rows).await?;

        let notifications = feed.notifications();
        assert_eq!(notifications.len(), 20);
        assert_eq!(notifications.as_slice()[0].id, RecordId::Persisted(25));
        assert_eq!(notifications.as_slice()[19].id, RecordId::Persisted(6));
        // ids 10, 15, 20, 25 are read
        assert_eq!(feed.unread_count(), 16);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_from_another_client_is_prepended() -> Result<()> {
        let (table, _channel, feed) = start_feed(vec![notification(1, 0, false)]).await?;

        table
            .insert(NotificationDraft::new("Budget dépassé", NotificationKind::Warning))
            .await?;
        settle(&feed).await?;

        let notifications = feed.notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications.as_slice()[0].message, "Budget dépassé");
        assert_eq!(feed.unread_count(), 2);
        assert_eq!(table.calls().await, vec![TableOp::Select, TableOp::Insert]);
        Ok(())
    }

    #[tokio::test]
    async fn test_own_insert_echo_is_not_duplicated() -> Result<()> {
        let (_table, _channel, feed) = start_feed(vec![]).await?;

        feed.notify("Tâche ajoutée au planning !", NotificationKind::Success)
            .await;
        settle(&feed).await?;

        let notifications = feed.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications.as_slice()[0].id, RecordId::Persisted(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_push_is_ignored() -> Result<()> {
        let (_table, channel, feed) = start_feed(vec![notification(1, 0, false)]).await?;
        let version = feed.notifications().version();

        channel.publish(
            lifeos_core::db::PushEventKind::Insert,
            notification(1, 0, false),
        );
        settle(&feed).await?;

        assert_eq!(feed.notifications().len(), 1);
        assert_eq!(feed.notifications().version(), version);
        Ok(())
    }

    #[tokio::test]
    async fn test_feed_stays_bounded_when_pushes_arrive() -> Result<()> {
        let rows: Vec<Notification> = (1..=20).map(|i| notification(i, i, false)).collect();
        let (_table, channel, feed) = start_feed(rows).await?;

        channel.publish(
            lifeos_core::db::PushEventKind::Insert,
            notification(21, 21, false),
        );
        settle(&feed).await?;

        let notifications = feed.notifications();
        assert_eq!(notifications.len(), 20);
        assert_eq!(notifications.as_slice()[0].id, RecordId::Persisted(21));
        assert!(!notifications.contains(RecordId::Persisted(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_all_read_resets_unread_immediately() -> Result<()> {
        let (table, _channel, feed) = start_feed(vec![
            notification(1, 0, false),
            notification(2, 1, false),
            notification(3, 2, true),
        ])
        .await?;
        assert_eq!(feed.unread_count(), 2);

        feed.mark_all_read().await?;
        assert_eq!(feed.unread_count(), 0);

        timeout(WAIT, feed.store().wait_idle()).await?;
        assert!(table.rows().await.iter().all(|n| n.read));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_mark_all_read_is_not_rolled_back() -> Result<()> {
        let (table, _channel, feed) = start_feed(vec![notification(1, 0, false)]).await?;
        let mut events = feed.store().subscribe_events();

        table.fail_next(TableOp::UpdateAll).await;
        feed.mark_all_read().await?;
        timeout(WAIT, feed.store().wait_idle()).await?;

        assert_eq!(feed.unread_count(), 0);
        assert!(events.try_recv()?.error().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_empties_feed_and_table() -> Result<()> {
        let (table, _channel, feed) =
            start_feed(vec![notification(1, 0, false), notification(2, 1, true)]).await?;

        feed.clear().await?;
        assert!(feed.notifications().is_empty());

        timeout(WAIT, feed.store().wait_idle()).await?;
        assert!(table.rows().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_teardown_stops_following_pushes() -> Result<()> {
        let (_table, channel, feed) = start_feed(vec![notification(1, 0, false)]).await?;

        feed.teardown();
        feed.teardown();
        settle(&feed).await?;

        channel.publish(
            lifeos_core::db::PushEventKind::Insert,
            notification(2, 5, false),
        );
        settle(&feed).await?;

        assert_eq!(feed.notifications().len(), 1);
        assert_eq!(channel.subscriber_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_start_is_reported() -> Result<()> {
        let channel = PushChannel::<Notification>::new(8);
        let table: Arc<InMemoryTable<Notification>> = Arc::new(InMemoryTable::new());
        table.fail_next(TableOp::Select).await;

        let result = NotificationFeed::start(table, &channel, &EngineConfig::default()).await;
        assert!(result.is_err());
        Ok(())
    }
}
