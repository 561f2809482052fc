use crate::config::Config;
use crate::db::Database;
use crate::planner::reminder::{self, LogNotifier, ReminderNotifier};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::path::Path;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};

/// Runs one reminder sweep per tick until the task is dropped.
///
/// Each tick finishes its sweep before the next is awaited, so sweeps never
/// overlap; ticks missed while a sweep runs are skipped.
pub async fn run_reminder_scheduler(config: Config) -> Result<()> {
    let period = Duration::from_secs(config.reminder_interval_minutes.max(1) * 60);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_minutes = config.reminder_interval_minutes,
        "reminder scheduler started"
    );

    loop {
        ticker.tick().await;

        let now = Local::now().naive_local();
        match run_once(&config.db_path, &LogNotifier, now) {
            Ok(0) => {}
            Ok(count) => info!(count, "reminders sent"),
            Err(error) => error!(error = %error, "reminder sweep failed"),
        }
    }
}

pub fn run_once<N>(db_path: &Path, notifier: &N, now: NaiveDateTime) -> Result<usize>
where
    N: ReminderNotifier + ?Sized,
{
    let database = Database::open(db_path)?;
    let reminded = reminder::scan(&database, notifier, now)?;

    Ok(reminded.len())
}
