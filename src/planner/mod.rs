//! Schedule engine: conflict detection, reminder sweeps and planning advice.
//!
//! Everything here works against the [`ScheduleStore`] trait and takes `now`
//! as an argument, so the same code runs over SQLite in production and over
//! fixed clocks in tests.

pub mod advice;
pub mod conflict;
pub mod reminder;
pub mod schedules;

use crate::model::Schedule;
use anyhow::Result;
use chrono::{Duration, NaiveDateTime, NaiveTime};

pub const DEFAULT_DURATION_MINUTES: i64 = 60;
pub const CONFLICT_PADDING_MINUTES: i64 = 15;
pub const REMINDER_LOOKAHEAD_MINUTES: i64 = 30;
/// Longest accepted estimate: one week.
pub const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

/// Durable schedule collection the engine reads from and writes reminder flags to.
pub trait ScheduleStore {
    fn find_all_uncompleted_ordered_by_time(&self) -> Result<Vec<Schedule>>;

    /// Schedules whose start lies in `[start, end]`, ordered by start.
    fn find_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Schedule>>;

    /// Uncompleted schedules whose start is before `now`.
    fn find_overdue(&self, now: NaiveDateTime) -> Result<Vec<Schedule>>;

    /// Completed schedules whose start is at or after `since`.
    fn count_completed_since(&self, since: NaiveDateTime) -> Result<i64>;

    /// Inserts when `id` is `None`, otherwise updates; returns the stored record.
    fn save(&self, schedule: &Schedule) -> Result<Schedule>;

    /// Sets only the reminder flag. `false` when the schedule was already
    /// reminded or no longer exists.
    fn mark_reminder_sent(&self, id: i64) -> Result<bool>;
}

/// `[midnight, 23:59:59]` of the day containing `now`.
pub fn today_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = now.date().and_time(NaiveTime::MIN);
    (start, start + Duration::days(1) - Duration::seconds(1))
}

/// Seven days forward from today's midnight.
pub fn week_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = now.date().and_time(NaiveTime::MIN);
    (start, start + Duration::days(7))
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Monday 2026-10-19 plus `days`, at `hour:minute`.
    pub fn at(days: i64, hour: u32, minute: u32) -> NaiveDateTime {
        let base = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        (base + chrono::Duration::days(days))
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }
}
