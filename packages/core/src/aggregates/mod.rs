//! Derived Aggregates
//!
//! Pure functions over collection snapshots. Nothing here is stored: every
//! value is recomputed from the records it summarizes, optionally memoized
//! per snapshot with [`Memo`].
//!
//! - [`finance`] - signed balance, running-balance chart, monthly expenses
//! - [`inventory`] - stock valuation, low-stock count, search
//! - [`progress`] - goal progress, task counts and filters, focus time, unread count
//! - [`habits`] - trailing 7-day habit grid
//! - [`calendar`] - events of a day, days of a month with events
//! - [`money`] - `fr-FR` currency formatting

pub mod calendar;
pub mod finance;
pub mod habits;
pub mod inventory;
pub mod money;
pub mod progress;

pub use calendar::{event_days_in_month, events_on};
pub use finance::{monthly_expenses, running_balance_series, signed_balance, BalancePoint};
pub use habits::{habit_week, HabitDay, HabitWeek};
pub use inventory::{low_stock_count, search, stock_value};
pub use money::{currency_symbol, format_money};
pub use progress::{
    filter_tasks, focus_minutes_on, focus_stats_on, goal_progress, milestone_counts, task_counts,
    unread_count, FocusStats, MilestoneCounts, TaskCounts,
};

use crate::engine::Collection;
use crate::models::Record;
use std::sync::Mutex;

/// Cache for one derived value, keyed on the snapshot version it was computed from
///
/// A `Memo` must only ever be fed snapshots of a single store; versions of
/// different stores are unrelated.
#[derive(Debug, Default)]
pub struct Memo<T> {
    cached: Mutex<Option<(u64, T)>>,
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self {
            cached: Mutex::new(None),
        }
    }

    /// Return the cached value for this snapshot, computing it on a miss
    pub fn get_or_compute<R, F>(&self, collection: &Collection<R>, derive: F) -> T
    where
        R: Record,
        F: FnOnce(&Collection<R>) -> T,
    {
        let mut cached = self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((version, value)) = cached.as_ref() {
            if *version == collection.version() {
                return value.clone();
            }
        }

        let value = derive(collection);
        *cached = Some((collection.version(), value.clone()));
        value
    }
}
