//! Domain Services
//!
//! One facade per dashboard module. Each service owns the record stores it
//! needs and receives its collaborators (remote tables, [`Notifier`])
//! explicitly:
//!
//! - [`TaskList`] - tasks with priority, completion and filters
//! - [`Ledger`] - income/expense transactions, balance and chart
//! - [`Inventory`] - stock items, valuation and low-stock alerts
//! - [`GoalBoard`] - goals and milestones with progress
//! - [`HabitTracker`] - habits and daily logs
//! - [`Journal`] - mood journal entries
//! - [`FocusTimer`] - finished focus sessions and today's focus time
//! - [`Calendar`] - scheduled events
//! - [`Dashboard`] - one-shot cross-module summary

pub mod calendar;
pub mod dashboard;
pub mod focus;
pub mod goals;
pub mod habits;
pub mod inventory;
pub mod journal;
pub mod ledger;
pub mod notifier;
pub mod tasks;

pub use calendar::Calendar;
pub use dashboard::{Dashboard, DashboardSummary};
pub use focus::FocusTimer;
pub use goals::GoalBoard;
pub use habits::HabitTracker;
pub use inventory::Inventory;
pub use journal::Journal;
pub use ledger::Ledger;
pub use notifier::{LogNotifier, Notifier};
pub use tasks::TaskList;
