//! Progress counters: goals, tasks, focus time, unread notifications

use crate::models::{FocusMode, FocusSession, Milestone, Notification, Task, TaskFilter};
use chrono::NaiveDate;
use serde::Serialize;

/// `round(100 × completed / total)`, 0 when there is nothing to complete
pub fn goal_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = completed.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MilestoneCounts {
    pub completed: usize,
    pub total: usize,
}

impl MilestoneCounts {
    pub fn percent(&self) -> u8 {
        goal_progress(self.completed, self.total)
    }
}

/// Milestone counts of one goal
pub fn milestone_counts<'a, I>(milestones: I, goal_id: i64) -> MilestoneCounts
where
    I: IntoIterator<Item = &'a Milestone>,
{
    milestones
        .into_iter()
        .filter(|m| m.goal_id == goal_id)
        .fold(MilestoneCounts::default(), |mut counts, m| {
            counts.total += 1;
            if m.done {
                counts.completed += 1;
            }
            counts
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pending + self.completed
    }

    /// Every task is complete and there is at least one
    pub fn all_done(&self) -> bool {
        self.completed > 0 && self.pending == 0
    }
}

pub fn task_counts<'a, I>(tasks: I) -> TaskCounts
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .fold(TaskCounts::default(), |mut counts, task| {
            if task.completed {
                counts.completed += 1;
            } else {
                counts.pending += 1;
            }
            counts
        })
}

pub fn filter_tasks<'a, I>(tasks: I, filter: TaskFilter) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|task| filter.matches(task)).collect()
}

/// Focus-mode sessions finished on one day; breaks are not counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FocusStats {
    pub sessions: usize,
    pub minutes: u32,
}

/// Focus-mode sessions created on `date` (UTC) and their total minutes
pub fn focus_stats_on<'a, I>(sessions: I, date: NaiveDate) -> FocusStats
where
    I: IntoIterator<Item = &'a FocusSession>,
{
    sessions
        .into_iter()
        .filter(|s| s.mode == FocusMode::Focus && s.created_at.date_naive() == date)
        .fold(FocusStats::default(), |stats, s| FocusStats {
            sessions: stats.sessions + 1,
            minutes: stats.minutes + s.duration,
        })
}

pub fn focus_minutes_on<'a, I>(sessions: I, date: NaiveDate) -> u32
where
    I: IntoIterator<Item = &'a FocusSession>,
{
    focus_stats_on(sessions, date).minutes
}

pub fn unread_count<'a, I>(notifications: I) -> usize
where
    I: IntoIterator<Item = &'a Notification>,
{
    notifications.into_iter().filter(|n| !n.read).count()
}
