use crate::model::Schedule;
use crate::planner::{REMINDER_LOOKAHEAD_MINUTES, ScheduleStore};
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use tracing::{error, info};

/// Delivery channel for "starting soon" reminders.
pub trait ReminderNotifier {
    fn notify(&self, schedule: &Schedule, now: NaiveDateTime);
}

/// Writes reminders to the service log.
pub struct LogNotifier;

impl ReminderNotifier for LogNotifier {
    fn notify(&self, schedule: &Schedule, now: NaiveDateTime) {
        info!(
            schedule_id = ?schedule.id,
            title = %schedule.title,
            starts_at = %schedule.scheduled_time,
            minutes_until = (schedule.scheduled_time - now).num_minutes(),
            "gaming session starting soon"
        );
    }
}

/// Marks and notifies every uncompleted, not-yet-reminded schedule starting
/// within the next 30 minutes.
///
/// Only the reminder flag is written, and only when it is still unset, so a
/// schedule is reminded at most once and concurrent edits are kept. The flag
/// is persisted before the notification goes out; a failed write only skips
/// that schedule.
pub fn scan<S, N>(store: &S, notifier: &N, now: NaiveDateTime) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
    N: ReminderNotifier + ?Sized,
{
    let until = now + Duration::minutes(REMINDER_LOOKAHEAD_MINUTES);

    let notified = store
        .find_between(now, until)?
        .into_iter()
        .filter(|schedule| !schedule.reminder_sent && !schedule.completed)
        .filter_map(|schedule| {
            let id = schedule.id?;

            match store.mark_reminder_sent(id) {
                Ok(true) => {
                    let marked = Schedule {
                        reminder_sent: true,
                        ..schedule
                    };
                    notifier.notify(&marked, now);
                    Some(marked)
                }
                Ok(false) => None,
                Err(error) => {
                    error!(error = %error, schedule_id = id, "failed to persist reminder flag");
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    Ok(notified)
}

#[cfg(test)]
mod tests {
    use super::{ReminderNotifier, scan};
    use crate::db::Database;
    use crate::model::{Schedule, ScheduleType};
    use crate::planner::ScheduleStore;
    use crate::planner::testing::at;
    use anyhow::{Result, bail};
    use chrono::NaiveDateTime;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNotifier {
        titles: RefCell<Vec<String>>,
    }

    impl ReminderNotifier for RecordingNotifier {
        fn notify(&self, schedule: &Schedule, _now: NaiveDateTime) {
            self.titles.borrow_mut().push(schedule.title.clone());
        }
    }

    struct FlakyStore {
        inner: Database,
        broken_id: i64,
    }

    impl ScheduleStore for FlakyStore {
        fn find_all_uncompleted_ordered_by_time(&self) -> Result<Vec<Schedule>> {
            self.inner.find_all_uncompleted_ordered_by_time()
        }

        fn find_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Schedule>> {
            self.inner.find_between(start, end)
        }

        fn find_overdue(&self, now: NaiveDateTime) -> Result<Vec<Schedule>> {
            self.inner.find_overdue(now)
        }

        fn count_completed_since(&self, since: NaiveDateTime) -> Result<i64> {
            self.inner.count_completed_since(since)
        }

        fn save(&self, schedule: &Schedule) -> Result<Schedule> {
            self.inner.save(schedule)
        }

        fn mark_reminder_sent(&self, id: i64) -> Result<bool> {
            if id == self.broken_id {
                bail!("disk full");
            }
            self.inner.mark_reminder_sent(id)
        }
    }

    #[test]
    fn reminds_once_within_lookahead() {
        let store = Database::open_in_memory().expect("db");
        let now = at(0, 19, 0);
        store
            .save(&Schedule::new("Raid night", at(0, 19, 20), ScheduleType::GroupEvent))
            .expect("save");
        let notifier = RecordingNotifier::default();

        let first = scan(&store, &notifier, now).expect("first scan");
        assert_eq!(first.len(), 1);
        assert!(first[0].reminder_sent);

        let second = scan(&store, &notifier, now).expect("second scan");
        assert!(second.is_empty());
        assert_eq!(*notifier.titles.borrow(), vec!["Raid night".to_string()]);
    }

    #[test]
    fn skips_completed_past_and_distant_schedules() {
        let store = Database::open_in_memory().expect("db");
        let now = at(0, 19, 0);
        let mut done = Schedule::new("done", at(0, 19, 10), ScheduleType::Daily);
        done.completed = true;
        for schedule in [
            done,
            Schedule::new("started", at(0, 18, 59), ScheduleType::Daily),
            Schedule::new("later", at(0, 19, 31), ScheduleType::Daily),
            Schedule::new("boundary", at(0, 19, 30), ScheduleType::Daily),
        ] {
            store.save(&schedule).expect("save");
        }

        let titles = scan(&store, &RecordingNotifier::default(), now)
            .expect("scan")
            .into_iter()
            .map(|schedule| schedule.title)
            .collect::<Vec<_>>();

        assert_eq!(titles, vec!["boundary"]);
    }

    #[test]
    fn save_failure_skips_only_that_schedule() {
        let inner = Database::open_in_memory().expect("db");
        let broken = inner
            .save(&Schedule::new("broken", at(0, 19, 5), ScheduleType::OneTime))
            .expect("save");
        inner
            .save(&Schedule::new("fine", at(0, 19, 10), ScheduleType::OneTime))
            .expect("save");
        let store = FlakyStore {
            inner,
            broken_id: broken.id.expect("id"),
        };
        let notifier = RecordingNotifier::default();

        let notified = scan(&store, &notifier, at(0, 19, 0)).expect("scan");

        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].title, "fine");
        assert_eq!(*notifier.titles.borrow(), vec!["fine".to_string()]);
    }

    #[test]
    fn scan_keeps_edits_made_after_the_lookup() {
        let store = Database::open_in_memory().expect("db");
        let fetched = store
            .save(&Schedule::new("Raid night", at(0, 19, 20), ScheduleType::GroupEvent))
            .expect("save");
        store
            .save(&Schedule {
                description: Some("bring flasks".to_string()),
                ..fetched.clone()
            })
            .expect("edit");

        let notified = scan(&store, &RecordingNotifier::default(), at(0, 19, 0)).expect("scan");
        assert_eq!(notified.len(), 1);

        let stored = store
            .schedule(fetched.id.expect("id"))
            .expect("query")
            .expect("exists");
        assert!(stored.reminder_sent);
        assert_eq!(stored.description.as_deref(), Some("bring flasks"));
    }
}
