//! Calendar lookups

use crate::models::CalendarEvent;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Events scheduled on `day` (UTC), in collection order
pub fn events_on<'a, I>(events: I, day: NaiveDate) -> Vec<&'a CalendarEvent>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    events.into_iter().filter(|event| event.is_on(day)).collect()
}

/// Days of the month (1-based) that have at least one event
pub fn event_days_in_month<'a, I>(events: I, year: i32, month: u32) -> BTreeSet<u32>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    events
        .into_iter()
        .map(|event| event.date.date_naive())
        .filter(|date| date.year() == year && date.month() == month)
        .map(|date| date.day())
        .collect()
}
