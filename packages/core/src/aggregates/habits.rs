//! Habit week grid

use crate::models::HabitLog;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HabitDay {
    pub date: NaiveDate,
    pub done: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitWeek {
    /// Trailing window, oldest first, ending on today
    pub days: Vec<HabitDay>,
    /// Distinct dates ever logged for the habit (not a streak)
    pub logged_days: usize,
}

pub fn habit_week<'a, I>(habit_id: i64, logs: I, today: NaiveDate) -> HabitWeek
where
    I: IntoIterator<Item = &'a HabitLog>,
{
    let logged: BTreeSet<NaiveDate> = logs
        .into_iter()
        .filter(|log| log.habit_id == habit_id)
        .map(|log| log.date)
        .collect();

    let days = (0..WEEK_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            HabitDay {
                date,
                done: logged.contains(&date),
                is_today: offset == 0,
            }
        })
        .collect();

    HabitWeek {
        days,
        logged_days: logged.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use chrono::Utc;

    fn log(id: i64, habit_id: i64, date: NaiveDate) -> HabitLog {
        HabitLog {
            id: RecordId::Persisted(id),
            habit_id,
            date,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_week_marks_logged_days() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let logs = vec![
            log(1, 1, today),
            log(2, 1, today - Duration::days(2)),
            log(3, 1, today - Duration::days(6)),
            log(4, 2, today - Duration::days(1)),
        ];

        let week = habit_week(1, &logs, today);
        assert_eq!(week.logged_days, 3);
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].date, today - Duration::days(6));
        assert!(week.days[6].is_today);

        let done: Vec<bool> = week.days.iter().map(|d| d.done).collect();
        assert_eq!(done, vec![true, false, false, false, true, false, true]);
    }

    #[test]
    fn test_logged_days_counts_outside_window_once() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let old = today - Duration::days(30);
        let logs = vec![log(1, 1, old), log(2, 1, old), log(3, 1, today)];

        let week = habit_week(1, &logs, today);
        assert_eq!(week.logged_days, 2);
        assert_eq!(week.days.iter().filter(|d| d.done).count(), 1);
    }
}
