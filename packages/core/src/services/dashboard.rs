//! Dashboard summary
//!
//! Unlike the other services, the dashboard keeps no store: it reads the
//! remote tables once per refresh.

use crate::aggregates::{focus_minutes_on, signed_balance};
use crate::db::{RemoteTable, SelectQuery};
use crate::engine::SyncError;
use crate::models::{FocusSession, Record, SortOrder, Task, Transaction};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::sync::Arc;

const RECENT_COMPLETED: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub pending_tasks: usize,
    pub balance: f64,
    pub focus_minutes_today: u32,
    /// Most recently created completed tasks
    pub recent_completed: Vec<Task>,
}

pub struct Dashboard {
    tasks: Arc<dyn RemoteTable<Task>>,
    transactions: Arc<dyn RemoteTable<Transaction>>,
    focus: Arc<dyn RemoteTable<FocusSession>>,
}

impl Dashboard {
    pub fn new(
        tasks: Arc<dyn RemoteTable<Task>>,
        transactions: Arc<dyn RemoteTable<Transaction>>,
        focus: Arc<dyn RemoteTable<FocusSession>>,
    ) -> Self {
        Self {
            tasks,
            transactions,
            focus,
        }
    }

    /// Fetch the three tables concurrently and summarize them
    pub async fn summary(&self, today: NaiveDate) -> Result<DashboardSummary, SyncError> {
        let start_of_day = today.and_time(NaiveTime::MIN).and_utc();
        let task_query = SelectQuery::ordered(Task::ORDER);
        let transaction_query = SelectQuery::ordered(Transaction::ORDER);
        let focus_query = SelectQuery::ordered(SortOrder::OldestFirst).created_after(start_of_day);

        let (tasks, transactions, sessions) = tokio::try_join!(
            async {
                self.tasks
                    .select(&task_query)
                    .await
                    .map_err(|e| SyncError::fetch_failure(Task::TABLE, e))
            },
            async {
                self.transactions
                    .select(&transaction_query)
                    .await
                    .map_err(|e| SyncError::fetch_failure(Transaction::TABLE, e))
            },
            async {
                self.focus
                    .select(&focus_query)
                    .await
                    .map_err(|e| SyncError::fetch_failure(FocusSession::TABLE, e))
            },
        )?;

        let summary = DashboardSummary {
            pending_tasks: tasks.iter().filter(|task| !task.completed).count(),
            balance: signed_balance(&transactions),
            focus_minutes_today: focus_minutes_on(&sessions, today),
            recent_completed: tasks
                .into_iter()
                .filter(|task| task.completed)
                .take(RECENT_COMPLETED)
                .collect(),
        };
        tracing::debug!(
            "Dashboard summary: {} pending task(s), {} focus minute(s)",
            summary.pending_tasks,
            summary.focus_minutes_today
        );
        Ok(summary)
    }
}
