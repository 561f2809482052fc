use chrono::{Duration, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub genre: String,
    pub platform: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameInput {
    pub name: String,
    pub genre: String,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    OneTime,
    Daily,
    Weekly,
    Tournament,
    GroupEvent,
    Practice,
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 6] = [
        ScheduleType::OneTime,
        ScheduleType::Daily,
        ScheduleType::Weekly,
        ScheduleType::Tournament,
        ScheduleType::GroupEvent,
        ScheduleType::Practice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleType::OneTime => "one_time",
            ScheduleType::Daily => "daily",
            ScheduleType::Weekly => "weekly",
            ScheduleType::Tournament => "tournament",
            ScheduleType::GroupEvent => "group_event",
            ScheduleType::Practice => "practice",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ScheduleType::OneTime => "One Time",
            ScheduleType::Daily => "Daily",
            ScheduleType::Weekly => "Weekly",
            ScheduleType::Tournament => "Tournament",
            ScheduleType::GroupEvent => "Raid/Group Event",
            ScheduleType::Practice => "Practice Session",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ScheduleType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| format!("Unknown schedule type: {raw}"))
    }
}

/// A planned play slot. Recurring types carry `day_of_week` for display only;
/// no instances are expanded from it.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub id: Option<i64>,
    pub title: String,
    pub game_id: Option<i64>,
    pub scheduled_time: NaiveDateTime,
    pub estimated_duration_minutes: Option<i64>,
    #[serde(rename = "type")]
    pub kind: ScheduleType,
    pub day_of_week: Option<Weekday>,
    pub description: Option<String>,
    pub completed: bool,
    pub reminder_sent: bool,
    pub created_at: NaiveDateTime,
}

impl Schedule {
    pub fn new(title: &str, scheduled_time: NaiveDateTime, kind: ScheduleType) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            game_id: None,
            scheduled_time,
            estimated_duration_minutes: None,
            kind,
            day_of_week: None,
            description: None,
            completed: false,
            reminder_sent: false,
            created_at: scheduled_time,
        }
    }

    #[cfg(test)]
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.estimated_duration_minutes = Some(minutes);
        self
    }

    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.scheduled_time > now && !self.completed
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.scheduled_time < now && !self.completed
    }

    /// Start plus the estimated duration, treating a missing duration as zero.
    /// Saturates at the calendar's upper bound instead of overflowing.
    pub fn estimated_end(&self) -> NaiveDateTime {
        Duration::try_minutes(self.estimated_duration_minutes.unwrap_or(0))
            .and_then(|duration| self.scheduled_time.checked_add_signed(duration))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Request body for creating or replacing a schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDraft {
    pub title: String,
    #[serde(default)]
    pub game_id: Option<i64>,
    pub scheduled_time: NaiveDateTime,
    #[serde(default)]
    pub estimated_duration_minutes: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: ScheduleType,
    #[serde(default)]
    pub day_of_week: Option<Weekday>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ScheduleDraft {
    pub fn into_schedule(self, created_at: NaiveDateTime) -> Schedule {
        Schedule {
            id: None,
            title: self.title,
            game_id: self.game_id,
            scheduled_time: self.scheduled_time,
            estimated_duration_minutes: self.estimated_duration_minutes,
            kind: self.kind,
            day_of_week: self.day_of_week,
            description: self.description,
            completed: false,
            reminder_sent: false,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    VeryFrustrated,
    Frustrated,
    Neutral,
    Good,
    Excellent,
}

impl MoodLevel {
    pub const ALL: [MoodLevel; 5] = [
        MoodLevel::VeryFrustrated,
        MoodLevel::Frustrated,
        MoodLevel::Neutral,
        MoodLevel::Good,
        MoodLevel::Excellent,
    ];

    pub fn value(self) -> i32 {
        match self {
            MoodLevel::VeryFrustrated => 1,
            MoodLevel::Frustrated => 2,
            MoodLevel::Neutral => 3,
            MoodLevel::Good => 4,
            MoodLevel::Excellent => 5,
        }
    }

    /// Unknown values fall back to `Neutral`.
    pub fn from_value(value: i32) -> Self {
        MoodLevel::ALL
            .into_iter()
            .find(|mood| mood.value() == value)
            .unwrap_or(MoodLevel::Neutral)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Terrible,
    Poor,
    Average,
    Good,
    Excellent,
}

impl PerformanceRating {
    pub const ALL: [PerformanceRating; 5] = [
        PerformanceRating::Terrible,
        PerformanceRating::Poor,
        PerformanceRating::Average,
        PerformanceRating::Good,
        PerformanceRating::Excellent,
    ];

    pub fn value(self) -> i32 {
        match self {
            PerformanceRating::Terrible => 1,
            PerformanceRating::Poor => 2,
            PerformanceRating::Average => 3,
            PerformanceRating::Good => 4,
            PerformanceRating::Excellent => 5,
        }
    }

    /// Unknown values fall back to `Average`.
    pub fn from_value(value: i32) -> Self {
        PerformanceRating::ALL
            .into_iter()
            .find(|rating| rating.value() == value)
            .unwrap_or(PerformanceRating::Average)
    }
}

/// Hardware readings attached to a session when it starts.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SystemSnapshot {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub game_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
    pub kills: Option<i32>,
    pub deaths: Option<i32>,
    pub assists: Option<i32>,
    pub accuracy: Option<f64>,
    pub score: Option<i32>,
    pub avg_fps: Option<f64>,
    pub avg_cpu_usage: Option<f64>,
    pub avg_gpu_usage: Option<f64>,
    pub avg_memory_usage: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub mood_before: Option<MoodLevel>,
    pub mood_after: Option<MoodLevel>,
    pub performance_rating: Option<PerformanceRating>,
    pub notes: Option<String>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn kd_ratio(&self) -> f64 {
        let kills = f64::from(self.kills.unwrap_or(0));
        match self.deaths {
            Some(deaths) if deaths != 0 => kills / f64::from(deaths),
            _ => kills,
        }
    }
}

/// Partial update applied by `update_session_stats`; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionUpdate {
    pub kills: Option<i32>,
    pub deaths: Option<i32>,
    pub assists: Option<i32>,
    pub accuracy: Option<f64>,
    pub score: Option<i32>,
    pub avg_fps: Option<f64>,
    pub mood_before: Option<MoodLevel>,
    pub mood_after: Option<MoodLevel>,
    pub performance_rating: Option<PerformanceRating>,
    pub notes: Option<String>,
}

impl SessionUpdate {
    pub fn apply(self, session: &mut Session) {
        if let Some(value) = self.kills {
            session.kills = Some(value);
        }
        if let Some(value) = self.deaths {
            session.deaths = Some(value);
        }
        if let Some(value) = self.assists {
            session.assists = Some(value);
        }
        if let Some(value) = self.accuracy {
            session.accuracy = Some(value);
        }
        if let Some(value) = self.score {
            session.score = Some(value);
        }
        if let Some(value) = self.avg_fps {
            session.avg_fps = Some(value);
        }
        if let Some(value) = self.mood_before {
            session.mood_before = Some(value);
        }
        if let Some(value) = self.mood_after {
            session.mood_after = Some(value);
        }
        if let Some(value) = self.performance_rating {
            session.performance_rating = Some(value);
        }
        if let Some(value) = self.notes {
            session.notes = Some(value);
        }
    }
}

/// Rounds to two decimal places, the precision every derived metric is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
