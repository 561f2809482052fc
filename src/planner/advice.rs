use crate::model::{Schedule, ScheduleType};
use crate::planner::{CONFLICT_PADDING_MINUTES, ScheduleStore, today_window, week_window};
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const MAX_SESSIONS_PER_DAY: usize = 4;

const PLAN_AHEAD: &str =
    "No upcoming gaming sessions scheduled. Plan your gaming time to maintain consistency!";
const SPREAD_OUT: &str = "You have many gaming sessions scheduled for some days. Consider spreading them out for better balance.";
const WELL_ORGANIZED: &str =
    "Your gaming schedule looks well organized! Keep up the good planning.";

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStats {
    pub completed_this_week: i64,
    pub completed_this_month: i64,
    pub upcoming_count: usize,
    pub overdue_count: usize,
    pub type_distribution: BTreeMap<ScheduleType, usize>,
}

pub fn schedule_stats<S>(store: &S, now: NaiveDateTime) -> Result<ScheduleStats>
where
    S: ScheduleStore + ?Sized,
{
    let upcoming = upcoming(store, now)?;

    let type_distribution = ScheduleType::ALL
        .into_iter()
        .map(|kind| {
            let count = upcoming
                .iter()
                .filter(|schedule| schedule.kind == kind)
                .count();
            (kind, count)
        })
        .collect::<BTreeMap<_, _>>();

    Ok(ScheduleStats {
        completed_this_week: store.count_completed_since(now - Duration::days(7))?,
        completed_this_month: store.count_completed_since(now - Duration::days(30))?,
        upcoming_count: upcoming.len(),
        overdue_count: store.find_overdue(now)?.len(),
        type_distribution,
    })
}

/// Advisory planning messages, in rule order: overdue, nothing planned,
/// tight back-to-back slots today, overloaded days this week. Falls back to
/// a single "well organized" message when no rule fires.
pub fn recommendations<S>(store: &S, now: NaiveDateTime) -> Result<Vec<String>>
where
    S: ScheduleStore + ?Sized,
{
    let overdue_count = store.find_overdue(now)?.len();
    let upcoming_count = upcoming(store, now)?.len();

    let (today_start, today_end) = today_window(now);
    let mut today = store.find_between(today_start, today_end)?;
    today.sort_by_key(|schedule| schedule.scheduled_time);

    let (week_start, week_end) = week_window(now);
    let week = store.find_between(week_start, week_end)?;

    let overdue_advice = (overdue_count > 0).then(|| {
        format!(
            "You have {overdue_count} overdue gaming sessions. Consider rescheduling or marking them as completed."
        )
    });
    let plan_ahead = (upcoming_count == 0).then(|| PLAN_AHEAD.to_string());
    let balance_advice = (busiest_day(&week) > MAX_SESSIONS_PER_DAY).then(|| SPREAD_OUT.to_string());

    let advice = overdue_advice
        .into_iter()
        .chain(plan_ahead)
        .chain(back_to_back_warnings(&today))
        .chain(balance_advice)
        .collect::<Vec<_>>();

    if advice.is_empty() {
        Ok(vec![WELL_ORGANIZED.to_string()])
    } else {
        Ok(advice)
    }
}

fn upcoming<S>(store: &S, now: NaiveDateTime) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
{
    let schedules = store
        .find_all_uncompleted_ordered_by_time()?
        .into_iter()
        .filter(|schedule| schedule.is_upcoming(now))
        .collect::<Vec<_>>();

    Ok(schedules)
}

fn back_to_back_warnings(ordered: &[Schedule]) -> Vec<String> {
    let padding = Duration::minutes(CONFLICT_PADDING_MINUTES);

    ordered
        .windows(2)
        .filter_map(|pair| match pair {
            [current, next] if current.estimated_end() > next.scheduled_time - padding => {
                Some(format!(
                    "Potential scheduling conflict detected between '{}' and '{}'. Consider adjusting times.",
                    current.title, next.title
                ))
            }
            _ => None,
        })
        .collect()
}

fn busiest_day(schedules: &[Schedule]) -> usize {
    schedules
        .iter()
        .fold(HashMap::new(), |mut acc, schedule| {
            *acc.entry(schedule.scheduled_time.weekday()).or_insert(0_usize) += 1;
            acc
        })
        .into_values()
        .max()
        .unwrap_or(0)
}
