pub mod performance;

use crate::analyzer::performance::GameAnalytics;
use crate::db::Database;
use crate::games::get_game;
use crate::model::round2;
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub sessions_this_week: i64,
    pub sessions_this_month: i64,
    pub playtime_this_week_hours: f64,
    pub playtime_this_month_hours: f64,
}

pub fn game_report(database: &Database, game_id: i64, now: NaiveDateTime) -> Result<GameAnalytics> {
    get_game(database, game_id)?;
    let sessions = database.rated_sessions_for_game(game_id)?;

    Ok(performance::game_analytics(&sessions, now))
}

pub fn overall_stats(database: &Database, now: NaiveDateTime) -> Result<OverallStats> {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    Ok(OverallStats {
        sessions_this_week: database.count_sessions_since(week_ago)?,
        sessions_this_month: database.count_sessions_since(month_ago)?,
        playtime_this_week_hours: hours(database.total_playtime_since(week_ago)?),
        playtime_this_month_hours: hours(database.total_playtime_since(month_ago)?),
    })
}

fn hours(minutes: i64) -> f64 {
    round2(minutes as f64 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::{game_report, overall_stats};
    use crate::analyzer::performance::GameAnalytics;
    use crate::db::Database;
    use crate::model::{GameInput, PerformanceRating, SessionUpdate, SystemSnapshot};
    use crate::sessions::{end_session, start_session, update_session_stats};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn play(database: &Database, game_id: i64, start: NaiveDateTime, minutes: i64) -> i64 {
        let session = start_session(database, game_id, &SystemSnapshot::default(), start)
            .expect("start");
        end_session(database, session.id, start + chrono::Duration::minutes(minutes)).expect("end");
        session.id
    }

    #[test]
    fn overall_stats_split_week_and_month() {
        let database = Database::open_in_memory().expect("db");
        let game = database
            .insert_game(
                &GameInput {
                    name: "Factorio".to_string(),
                    genre: "Strategy".to_string(),
                    platform: None,
                },
                at(1, 8, 0),
            )
            .expect("game");

        play(&database, game.id, at(2, 20, 0), 120);
        play(&database, game.id, at(17, 20, 0), 50);

        let stats = overall_stats(&database, at(19, 12, 0)).expect("stats");
        assert_eq!(stats.sessions_this_week, 1);
        assert_eq!(stats.sessions_this_month, 2);
        assert_eq!(stats.playtime_this_week_hours, 0.83);
        assert_eq!(stats.playtime_this_month_hours, 2.83);
    }

    #[test]
    fn game_report_only_considers_rated_sessions() {
        let database = Database::open_in_memory().expect("db");
        let game = database
            .insert_game(
                &GameInput {
                    name: "Factorio".to_string(),
                    genre: "Strategy".to_string(),
                    platform: None,
                },
                at(1, 8, 0),
            )
            .expect("game");

        let unrated = play(&database, game.id, at(16, 20, 0), 30);
        assert!(matches!(
            game_report(&database, game.id, at(19, 12, 0)).expect("report"),
            GameAnalytics::NoData { .. }
        ));

        update_session_stats(
            &database,
            unrated,
            SessionUpdate {
                performance_rating: Some(PerformanceRating::Good),
                ..SessionUpdate::default()
            },
        )
        .expect("rate");

        match game_report(&database, game.id, at(19, 12, 0)).expect("report") {
            GameAnalytics::Report(report) => assert_eq!(report.total_sessions, 1),
            GameAnalytics::NoData { message } => panic!("unexpected: {message}"),
        }

        assert!(game_report(&database, 404, at(19, 12, 0)).is_err());
    }
}
