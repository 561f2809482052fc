use crate::db::Database;
use crate::error::TrackerError;
use crate::games::get_game;
use crate::model::{Schedule, ScheduleDraft};
use crate::planner::conflict::find_conflicts;
use crate::planner::{MAX_DURATION_MINUTES, ScheduleStore, today_window, week_window};
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::info;

pub fn upcoming_schedules<S>(store: &S) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
{
    store.find_all_uncompleted_ordered_by_time()
}

pub fn schedules_for_today<S>(store: &S, now: NaiveDateTime) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
{
    let (start, end) = today_window(now);
    store.find_between(start, end)
}

pub fn schedules_for_week<S>(store: &S, now: NaiveDateTime) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
{
    let (start, end) = week_window(now);
    store.find_between(start, end)
}

pub fn create_schedule(
    database: &Database,
    draft: ScheduleDraft,
    now: NaiveDateTime,
) -> Result<Schedule> {
    validate(database, &draft)?;

    let candidate = draft.into_schedule(now);
    let conflicts = find_conflicts(database, &candidate, None)?;
    if !conflicts.is_empty() {
        return Err(TrackerError::ScheduleConflict {
            count: conflicts.len(),
        }
        .into());
    }

    let saved = database.save(&candidate)?;
    info!(schedule_id = ?saved.id, title = %saved.title, "schedule created");

    Ok(saved)
}

pub fn update_schedule(database: &Database, id: i64, draft: ScheduleDraft) -> Result<Schedule> {
    validate(database, &draft)?;

    let existing = require_schedule(database, id)?;
    let reminder_sent = existing.reminder_sent && existing.scheduled_time == draft.scheduled_time;

    let candidate = Schedule {
        title: draft.title,
        game_id: draft.game_id,
        scheduled_time: draft.scheduled_time,
        estimated_duration_minutes: draft.estimated_duration_minutes,
        kind: draft.kind,
        day_of_week: draft.day_of_week,
        description: draft.description,
        reminder_sent,
        ..existing
    };

    let conflicts = find_conflicts(database, &candidate, Some(id))?;
    if !conflicts.is_empty() {
        return Err(TrackerError::ScheduleConflict {
            count: conflicts.len(),
        }
        .into());
    }

    database.save(&candidate)
}

pub fn complete_schedule(database: &Database, id: i64) -> Result<Schedule> {
    let existing = require_schedule(database, id)?;

    database.save(&Schedule {
        completed: true,
        ..existing
    })
}

pub fn delete_schedule(database: &Database, id: i64) -> Result<()> {
    if !database.delete_schedule(id)? {
        return Err(TrackerError::NotFound {
            entity: "Schedule",
            id,
        }
        .into());
    }

    Ok(())
}

/// Conflicts of a stored schedule against everything else.
pub fn schedule_conflicts(database: &Database, id: i64) -> Result<Vec<Schedule>> {
    let schedule = require_schedule(database, id)?;
    find_conflicts(database, &schedule, Some(id))
}

fn require_schedule(database: &Database, id: i64) -> Result<Schedule> {
    database.schedule(id)?.ok_or_else(|| {
        TrackerError::NotFound {
            entity: "Schedule",
            id,
        }
        .into()
    })
}

fn validate(database: &Database, draft: &ScheduleDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(TrackerError::InvalidInput {
            field: "title",
            reason: "must not be blank".to_string(),
        }
        .into());
    }

    if let Some(game_id) = draft.game_id {
        get_game(database, game_id)?;
    }

    match draft.estimated_duration_minutes {
        Some(minutes) if minutes <= 0 => Err(TrackerError::InvalidInput {
            field: "estimated_duration_minutes",
            reason: format!("must be positive, got {minutes}"),
        }
        .into()),
        Some(minutes) if minutes > MAX_DURATION_MINUTES => Err(TrackerError::InvalidInput {
            field: "estimated_duration_minutes",
            reason: format!("must be at most {MAX_DURATION_MINUTES}, got {minutes}"),
        }
        .into()),
        _ => Ok(()),
    }
}
