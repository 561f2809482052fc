use crate::db::Database;
use crate::error::TrackerError;
use crate::games::get_game;
use crate::model::{Session, SessionUpdate, SystemSnapshot};
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use tracing::info;

/// Opens a session for the game, stamping the hardware readings taken at start.
pub fn start_session(
    database: &Database,
    game_id: i64,
    snapshot: &SystemSnapshot,
    now: NaiveDateTime,
) -> Result<Session> {
    let game = get_game(database, game_id)?;

    if database.active_session_for_game(game_id)?.is_some() {
        return Err(TrackerError::ActiveSessionExists { game_id }.into());
    }

    let session = database.insert_session(game_id, now, snapshot)?;
    info!(session_id = session.id, game = %game.name, "session started");

    Ok(session)
}

pub fn end_session(database: &Database, id: i64, now: NaiveDateTime) -> Result<Session> {
    let mut session = get_session(database, id)?;

    if !session.is_active() {
        return Err(TrackerError::SessionAlreadyEnded { session_id: id }.into());
    }

    session.end_time = Some(now);
    session.duration_minutes = Some((now - session.start_time).num_minutes());
    database.update_session(&session)?;

    info!(
        session_id = id,
        duration_minutes = ?session.duration_minutes,
        "session ended"
    );

    Ok(session)
}

pub fn update_session_stats(database: &Database, id: i64, update: SessionUpdate) -> Result<Session> {
    let mut session = get_session(database, id)?;
    update.apply(&mut session);
    database.update_session(&session)?;

    Ok(session)
}

pub fn sessions_for_game(database: &Database, game_id: i64) -> Result<Vec<Session>> {
    get_game(database, game_id)?;
    database.sessions_for_game(game_id)
}

pub fn active_sessions(database: &Database) -> Result<Vec<Session>> {
    database.active_sessions()
}

pub fn recent_sessions(database: &Database, days: i64, now: NaiveDateTime) -> Result<Vec<Session>> {
    if days < 0 {
        return Err(invalid_days(format!("must not be negative, got {days}")));
    }

    let since = Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| invalid_days(format!("{days} reaches past the calendar range")))?;

    database.sessions_between(since, now)
}

pub fn get_session(database: &Database, id: i64) -> Result<Session> {
    database.session(id)?.ok_or_else(|| not_found(id))
}

pub fn delete_session(database: &Database, id: i64) -> Result<()> {
    if !database.delete_session(id)? {
        return Err(not_found(id));
    }

    Ok(())
}

fn invalid_days(reason: String) -> anyhow::Error {
    TrackerError::InvalidInput {
        field: "days",
        reason,
    }
    .into()
}

fn not_found(id: i64) -> anyhow::Error {
    TrackerError::NotFound {
        entity: "Session",
        id,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameInput, MoodLevel, PerformanceRating};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn seeded() -> (Database, i64) {
        let database = Database::open_in_memory().expect("db");
        let game = database
            .insert_game(
                &GameInput {
                    name: "Rocket League".to_string(),
                    genre: "Sports".to_string(),
                    platform: None,
                },
                at(1, 8, 0),
            )
            .expect("game");
        (database, game.id)
    }

    fn tracker_error(error: &anyhow::Error) -> &TrackerError {
        error.downcast_ref::<TrackerError>().expect("domain error")
    }

    #[test]
    fn one_active_session_per_game() {
        let (database, game_id) = seeded();
        let snapshot = SystemSnapshot {
            cpu_usage: Some(42.5),
            memory_usage: Some(61.0),
            temperature: None,
        };

        let session = start_session(&database, game_id, &snapshot, at(19, 20, 0)).expect("start");
        assert_eq!(session.avg_cpu_usage, Some(42.5));
        assert_eq!(session.avg_temperature, None);

        let error = start_session(&database, game_id, &snapshot, at(19, 20, 5))
            .expect_err("second start");
        assert!(matches!(
            tracker_error(&error),
            TrackerError::ActiveSessionExists { .. }
        ));

        end_session(&database, session.id, at(19, 21, 0)).expect("end");
        start_session(&database, game_id, &snapshot, at(19, 22, 0)).expect("restart");
    }

    #[test]
    fn ending_derives_whole_minutes_once() {
        let (database, game_id) = seeded();
        let session = start_session(&database, game_id, &SystemSnapshot::default(), at(19, 20, 0))
            .expect("start");

        let ended = end_session(
            &database,
            session.id,
            at(19, 21, 30) + Duration::seconds(59),
        )
        .expect("end");
        assert_eq!(ended.duration_minutes, Some(90));
        assert!(!ended.is_active());

        let error = end_session(&database, session.id, at(19, 22, 0)).expect_err("twice");
        assert!(matches!(
            tracker_error(&error),
            TrackerError::SessionAlreadyEnded { .. }
        ));
    }

    #[test]
    fn stats_update_merges_present_fields() {
        let (database, game_id) = seeded();
        let session = start_session(&database, game_id, &SystemSnapshot::default(), at(19, 20, 0))
            .expect("start");

        update_session_stats(
            &database,
            session.id,
            SessionUpdate {
                kills: Some(12),
                deaths: Some(4),
                mood_before: Some(MoodLevel::Neutral),
                ..SessionUpdate::default()
            },
        )
        .expect("first update");
        let updated = update_session_stats(
            &database,
            session.id,
            SessionUpdate {
                performance_rating: Some(PerformanceRating::Good),
                notes: Some("carried".to_string()),
                ..SessionUpdate::default()
            },
        )
        .expect("second update");

        assert_eq!(updated.kills, Some(12));
        assert_eq!(updated.kd_ratio(), 3.0);
        assert_eq!(updated.performance_rating, Some(PerformanceRating::Good));

        let stored = get_session(&database, session.id).expect("stored");
        assert_eq!(stored.mood_before, Some(MoodLevel::Neutral));
        assert_eq!(stored.notes.as_deref(), Some("carried"));
    }

    #[test]
    fn recent_sessions_are_newest_first_within_window() {
        let (database, game_id) = seeded();
        for day in [5, 14, 17] {
            let session =
                start_session(&database, game_id, &SystemSnapshot::default(), at(day, 20, 0))
                    .expect("start");
            end_session(&database, session.id, at(day, 21, 0)).expect("end");
        }

        let starts = recent_sessions(&database, 7, at(19, 12, 0))
            .expect("recent")
            .into_iter()
            .map(|session| session.start_time)
            .collect::<Vec<_>>();
        assert_eq!(starts, vec![at(17, 20, 0), at(14, 20, 0)]);
    }

    #[test]
    fn recent_window_rejects_out_of_range_days() {
        let (database, _) = seeded();

        for days in [-1, 1_000_000_000, i64::MAX] {
            let error = recent_sessions(&database, days, at(19, 12, 0)).expect_err("bad window");
            assert!(matches!(
                tracker_error(&error),
                TrackerError::InvalidInput { field: "days", .. }
            ));
        }
        assert!(recent_sessions(&database, 0, at(19, 12, 0)).expect("empty").is_empty());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (database, _) = seeded();

        assert!(
            tracker_error(&start_session(&database, 77, &SystemSnapshot::default(), at(19, 8, 0))
                .expect_err("no game"))
            .is_not_found()
        );
        assert!(tracker_error(&sessions_for_game(&database, 77).expect_err("no game")).is_not_found());
        assert!(tracker_error(&delete_session(&database, 5).expect_err("no session")).is_not_found());
        assert!(active_sessions(&database).expect("active").is_empty());
    }
}
