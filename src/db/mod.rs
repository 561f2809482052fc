pub mod queries;

use crate::error::TrackerError;
use crate::model::{
    Game, GameInput, MoodLevel, PerformanceRating, Schedule, ScheduleType, Session,
    SystemSnapshot,
};
use crate::planner::ScheduleStore;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Weekday};
use queries::{GAME_COLUMNS, SCHEDULE_COLUMNS, SESSION_COLUMNS};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use std::fs;
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn insert_game(&self, input: &GameInput, created_at: NaiveDateTime) -> Result<Game> {
        self.conn
            .execute(
                "INSERT INTO games (name, genre, platform, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![input.name, input.genre, input.platform, created_at],
            )
            .context("Failed to insert game")?;

        Ok(Game {
            id: self.conn.last_insert_rowid(),
            name: input.name.clone(),
            genre: input.genre.clone(),
            platform: input.platform.clone(),
            created_at,
        })
    }

    pub fn update_game(&self, id: i64, input: &GameInput) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE games SET name = ?1, genre = ?2, platform = ?3 WHERE id = ?4",
                params![input.name, input.genre, input.platform, id],
            )
            .context("Failed to update game")?;

        Ok(updated > 0)
    }

    pub fn delete_game(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM games WHERE id = ?1", params![id])
            .context("Failed to delete game")?;

        Ok(deleted > 0)
    }

    pub fn game(&self, id: i64) -> Result<Option<Game>> {
        self.conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
                params![id],
                game_from_row,
            )
            .optional()
            .context("Failed to query game")
    }

    pub fn game_by_name(&self, name: &str) -> Result<Option<Game>> {
        self.conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE name = ?1 COLLATE NOCASE"),
                params![name.trim()],
                game_from_row,
            )
            .optional()
            .context("Failed to query game by name")
    }

    pub fn list_games(&self) -> Result<Vec<Game>> {
        self.query_all(
            &format!("SELECT {GAME_COLUMNS} FROM games ORDER BY name COLLATE NOCASE ASC"),
            [],
            game_from_row,
            "games",
        )
    }

    pub fn games_by_genre(&self, genre: &str) -> Result<Vec<Game>> {
        self.query_all(
            &format!(
                "SELECT {GAME_COLUMNS} FROM games WHERE genre = ?1 COLLATE NOCASE ORDER BY name COLLATE NOCASE"
            ),
            params![genre],
            game_from_row,
            "games by genre",
        )
    }

    pub fn games_by_platform(&self, platform: &str) -> Result<Vec<Game>> {
        self.query_all(
            &format!(
                "SELECT {GAME_COLUMNS} FROM games WHERE platform = ?1 COLLATE NOCASE ORDER BY name COLLATE NOCASE"
            ),
            params![platform],
            game_from_row,
            "games by platform",
        )
    }

    pub fn genres(&self) -> Result<Vec<String>> {
        self.query_all(
            "SELECT DISTINCT genre FROM games ORDER BY genre",
            [],
            |row| row.get(0),
            "genres",
        )
    }

    pub fn platforms(&self) -> Result<Vec<String>> {
        self.query_all(
            "SELECT DISTINCT platform FROM games WHERE platform IS NOT NULL ORDER BY platform",
            [],
            |row| row.get(0),
            "platforms",
        )
    }

    pub fn most_played_games(&self) -> Result<Vec<Game>> {
        self.query_all(
            "SELECT g.id, g.name, g.genre, g.platform, g.created_at
             FROM games g
             JOIN sessions s ON s.game_id = g.id
             GROUP BY g.id
             ORDER BY COUNT(s.id) DESC, g.name ASC",
            [],
            game_from_row,
            "most played games",
        )
    }

    pub fn insert_session(
        &self,
        game_id: i64,
        start_time: NaiveDateTime,
        snapshot: &SystemSnapshot,
    ) -> Result<Session> {
        let inserted = self.conn.execute(
            "INSERT INTO sessions (game_id, start_time, avg_cpu_usage, avg_memory_usage, avg_temperature)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                game_id,
                start_time,
                snapshot.cpu_usage,
                snapshot.memory_usage,
                snapshot.temperature
            ],
        );

        match inserted {
            Err(error) if is_unique_violation(&error) => {
                return Err(TrackerError::ActiveSessionExists { game_id }.into());
            }
            other => other.context("Failed to insert session")?,
        };

        let id = self.conn.last_insert_rowid();
        self.session(id)?
            .with_context(|| format!("Inserted session {id} could not be read back"))
    }

    pub fn update_session(&self, session: &Session) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sessions
                 SET end_time = ?1, duration_minutes = ?2, kills = ?3, deaths = ?4, assists = ?5,
                     accuracy = ?6, score = ?7, avg_fps = ?8, avg_cpu_usage = ?9, avg_gpu_usage = ?10,
                     avg_memory_usage = ?11, avg_temperature = ?12, mood_before = ?13,
                     mood_after = ?14, performance_rating = ?15, notes = ?16
                 WHERE id = ?17",
                params![
                    session.end_time,
                    session.duration_minutes,
                    session.kills,
                    session.deaths,
                    session.assists,
                    session.accuracy,
                    session.score,
                    session.avg_fps,
                    session.avg_cpu_usage,
                    session.avg_gpu_usage,
                    session.avg_memory_usage,
                    session.avg_temperature,
                    session.mood_before.map(MoodLevel::value),
                    session.mood_after.map(MoodLevel::value),
                    session.performance_rating.map(PerformanceRating::value),
                    session.notes,
                    session.id,
                ],
            )
            .context("Failed to update session")?;

        Ok(())
    }

    pub fn delete_session(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])
            .context("Failed to delete session")?;

        Ok(deleted > 0)
    }

    pub fn session(&self, id: i64) -> Result<Option<Session>> {
        self.conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()
            .context("Failed to query session")
    }

    pub fn active_session_for_game(&self, game_id: i64) -> Result<Option<Session>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE game_id = ?1 AND end_time IS NULL LIMIT 1"
                ),
                params![game_id],
                session_from_row,
            )
            .optional()
            .context("Failed to query active session")
    }

    pub fn active_sessions(&self) -> Result<Vec<Session>> {
        self.query_all(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE end_time IS NULL ORDER BY start_time DESC"
            ),
            [],
            session_from_row,
            "active sessions",
        )
    }

    pub fn sessions_for_game(&self, game_id: i64) -> Result<Vec<Session>> {
        self.query_all(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE game_id = ?1 ORDER BY start_time DESC"
            ),
            params![game_id],
            session_from_row,
            "sessions for game",
        )
    }

    pub fn rated_sessions_for_game(&self, game_id: i64) -> Result<Vec<Session>> {
        self.query_all(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE game_id = ?1 AND performance_rating IS NOT NULL
                 ORDER BY start_time DESC"
            ),
            params![game_id],
            session_from_row,
            "rated sessions",
        )
    }

    pub fn sessions_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<Session>> {
        self.query_all(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE start_time >= ?1 AND start_time <= ?2
                 ORDER BY start_time DESC"
            ),
            params![from, to],
            session_from_row,
            "sessions",
        )
    }

    pub fn count_sessions_since(&self, since: NaiveDateTime) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE start_time >= ?1",
                params![since],
                |row| row.get(0),
            )
            .context("Failed to count sessions")
    }

    pub fn total_playtime_since(&self, since: NaiveDateTime) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(duration_minutes), 0) FROM sessions
                 WHERE start_time >= ?1 AND duration_minutes IS NOT NULL",
                params![since],
                |row| row.get(0),
            )
            .context("Failed to sum playtime")
    }

    pub fn latest_session_start(&self) -> Result<Option<NaiveDateTime>> {
        self.conn
            .query_row("SELECT MAX(start_time) FROM sessions", [], |row| row.get(0))
            .context("Failed to query latest session")
    }

    pub fn schedule(&self, id: i64) -> Result<Option<Schedule>> {
        self.conn
            .query_row(
                &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
                params![id],
                schedule_from_row,
            )
            .optional()
            .context("Failed to query schedule")
    }

    pub fn delete_schedule(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?1", params![id])
            .context("Failed to delete schedule")?;

        Ok(deleted > 0)
    }

    fn insert_schedule(&self, schedule: &Schedule) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO schedules (title, game_id, scheduled_time, estimated_duration_minutes, type,
                                        day_of_week, description, is_completed, reminder_sent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    schedule.title,
                    schedule.game_id,
                    schedule.scheduled_time,
                    schedule.estimated_duration_minutes,
                    schedule.kind.as_str(),
                    schedule.day_of_week.map(weekday_index),
                    schedule.description,
                    schedule.completed,
                    schedule.reminder_sent,
                    schedule.created_at,
                ],
            )
            .context("Failed to insert schedule")?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_schedule(&self, id: i64, schedule: &Schedule) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE schedules
                 SET title = ?1, game_id = ?2, scheduled_time = ?3, estimated_duration_minutes = ?4,
                     type = ?5, day_of_week = ?6, description = ?7, is_completed = ?8,
                     reminder_sent = ?9
                 WHERE id = ?10",
                params![
                    schedule.title,
                    schedule.game_id,
                    schedule.scheduled_time,
                    schedule.estimated_duration_minutes,
                    schedule.kind.as_str(),
                    schedule.day_of_week.map(weekday_index),
                    schedule.description,
                    schedule.completed,
                    schedule.reminder_sent,
                    id,
                ],
            )
            .context("Failed to update schedule")?;

        if updated == 0 {
            return Err(TrackerError::NotFound {
                entity: "Schedule",
                id,
            }
            .into());
        }

        Ok(())
    }

    fn query_all<T, P, F>(&self, sql: &str, params: P, mapper: F, label: &str) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut statement = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query for {label}"))?;

        let rows = statement
            .query_map(params, mapper)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to query {label}"))?;

        Ok(rows)
    }
}

impl ScheduleStore for Database {
    fn find_all_uncompleted_ordered_by_time(&self) -> Result<Vec<Schedule>> {
        self.query_all(
            &format!(
                "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE is_completed = 0 ORDER BY scheduled_time ASC"
            ),
            [],
            schedule_from_row,
            "uncompleted schedules",
        )
    }

    fn find_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Schedule>> {
        self.query_all(
            &format!(
                "SELECT {SCHEDULE_COLUMNS} FROM schedules
                 WHERE scheduled_time >= ?1 AND scheduled_time <= ?2
                 ORDER BY scheduled_time ASC"
            ),
            params![start, end],
            schedule_from_row,
            "schedules in range",
        )
    }

    fn find_overdue(&self, now: NaiveDateTime) -> Result<Vec<Schedule>> {
        self.query_all(
            &format!(
                "SELECT {SCHEDULE_COLUMNS} FROM schedules
                 WHERE scheduled_time < ?1 AND is_completed = 0
                 ORDER BY scheduled_time ASC"
            ),
            params![now],
            schedule_from_row,
            "overdue schedules",
        )
    }

    fn count_completed_since(&self, since: NaiveDateTime) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM schedules WHERE is_completed = 1 AND scheduled_time >= ?1",
                params![since],
                |row| row.get(0),
            )
            .context("Failed to count completed schedules")
    }

    fn save(&self, schedule: &Schedule) -> Result<Schedule> {
        let id = match schedule.id {
            Some(id) => {
                self.update_schedule(id, schedule)?;
                id
            }
            None => self.insert_schedule(schedule)?,
        };

        Ok(Schedule {
            id: Some(id),
            ..schedule.clone()
        })
    }

    fn mark_reminder_sent(&self, id: i64) -> Result<bool> {
        let marked = self
            .conn
            .execute(
                "UPDATE schedules SET reminder_sent = 1 WHERE id = ?1 AND reminder_sent = 0",
                params![id],
            )
            .with_context(|| format!("Failed to mark reminder for schedule {id}"))?;

        Ok(marked > 0)
    }
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(error, rusqlite::Error::SqliteFailure(failure, _)
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        name: row.get(1)?,
        genre: row.get(2)?,
        platform: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        game_id: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        duration_minutes: row.get(4)?,
        kills: row.get(5)?,
        deaths: row.get(6)?,
        assists: row.get(7)?,
        accuracy: row.get(8)?,
        score: row.get(9)?,
        avg_fps: row.get(10)?,
        avg_cpu_usage: row.get(11)?,
        avg_gpu_usage: row.get(12)?,
        avg_memory_usage: row.get(13)?,
        avg_temperature: row.get(14)?,
        mood_before: row.get::<_, Option<i32>>(15)?.map(MoodLevel::from_value),
        mood_after: row.get::<_, Option<i32>>(16)?.map(MoodLevel::from_value),
        performance_rating: row
            .get::<_, Option<i32>>(17)?
            .map(PerformanceRating::from_value),
        notes: row.get(18)?,
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    let raw_type: String = row.get(5)?;
    let kind = raw_type
        .parse::<ScheduleType>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, error.into()))?;

    Ok(Schedule {
        id: row.get(0)?,
        title: row.get(1)?,
        game_id: row.get(2)?,
        scheduled_time: row.get(3)?,
        estimated_duration_minutes: row.get(4)?,
        kind,
        day_of_week: row.get::<_, Option<i64>>(6)?.and_then(weekday_from_index),
        description: row.get(7)?,
        completed: row.get(8)?,
        reminder_sent: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn weekday_index(day: Weekday) -> i64 {
    i64::from(day.num_days_from_monday())
}

fn weekday_from_index(index: i64) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}
