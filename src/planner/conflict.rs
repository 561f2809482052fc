use crate::error::TrackerError;
use crate::model::Schedule;
use crate::planner::{CONFLICT_PADDING_MINUTES, DEFAULT_DURATION_MINUTES, ScheduleStore};
use anyhow::Result;
use chrono::Duration;

/// Returns uncompleted schedules starting inside the candidate's padded slot.
///
/// The slot is `[start - 15m, start + duration + 15m]`, where a missing
/// duration counts as 60 minutes. `exclude_id` (or, failing that, the
/// candidate's own id) is dropped so an update never conflicts with itself.
/// Reports only; rejecting the candidate is up to the caller.
pub fn find_conflicts<S>(
    store: &S,
    candidate: &Schedule,
    exclude_id: Option<i64>,
) -> Result<Vec<Schedule>>
where
    S: ScheduleStore + ?Sized,
{
    let duration = candidate
        .estimated_duration_minutes
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    let padding = Duration::minutes(CONFLICT_PADDING_MINUTES);

    let window = Duration::try_minutes(duration).and_then(|slot| {
        let start = candidate.scheduled_time.checked_sub_signed(padding)?;
        let end = candidate
            .scheduled_time
            .checked_add_signed(slot)?
            .checked_add_signed(padding)?;
        Some((start, end))
    });
    let Some((window_start, window_end)) = window else {
        return Err(TrackerError::InvalidInput {
            field: "estimated_duration_minutes",
            reason: format!("{duration} minutes runs past the calendar range"),
        }
        .into());
    };
    let excluded = exclude_id.or(candidate.id);

    let conflicts = store
        .find_between(window_start, window_end)?
        .into_iter()
        .filter(|existing| excluded.is_none() || existing.id != excluded)
        .filter(|existing| !existing.completed)
        .collect::<Vec<_>>();

    Ok(conflicts)
}
