use crate::model::{Session, round2};
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

const TREND_WINDOW: usize = 5;
const TREND_THRESHOLD: f64 = 0.5;
const LONG_SESSION_MINUTES: f64 = 180.0;
const LOW_FPS: f64 = 30.0;
const HIGH_FPS: f64 = 144.0;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GameAnalytics {
    NoData { message: String },
    Report(Box<PerformanceReport>),
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub total_sessions: usize,
    pub average_session_duration: f64,
    pub total_playtime: i64,
    pub performance_trend: Trend,
    pub average_performance_rating: f64,
    pub average_kd_ratio: Option<f64>,
    pub mood_analysis: MoodAnalysis,
    pub system_performance: SystemPerformance,
    pub gaming_patterns: GamingPatterns,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    InsufficientData,
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub status: TrendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MoodAnalysis {
    NoData {
        message: &'static str,
    },
    Summary {
        average_mood_before: f64,
        average_mood_after: f64,
        mood_improvement: f64,
        impact: &'static str,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemPerformance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cpu_usage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamingPatterns {
    pub peak_gaming_hour: Option<String>,
    pub sessions_this_week: usize,
    pub average_sessions_per_day: f64,
}

/// Builds the per-game report from the game's rated sessions.
pub fn game_analytics(sessions: &[Session], now: NaiveDateTime) -> GameAnalytics {
    if sessions.is_empty() {
        return GameAnalytics::NoData {
            message: "No performance data available for this game yet.".to_string(),
        };
    }

    let week_ago = now - Duration::days(7);
    let recent = sessions
        .iter()
        .filter(|session| session.start_time > week_ago)
        .collect::<Vec<_>>();

    let durations = sessions
        .iter()
        .filter_map(|session| session.duration_minutes)
        .collect::<Vec<_>>();

    GameAnalytics::Report(Box::new(PerformanceReport {
        total_sessions: sessions.len(),
        average_session_duration: mean(durations.iter().map(|minutes| *minutes as f64))
            .unwrap_or(0.0),
        total_playtime: durations.iter().sum(),
        performance_trend: performance_trend(sessions),
        average_performance_rating: mean(ratings(sessions.iter())).unwrap_or(0.0),
        average_kd_ratio: mean(
            sessions
                .iter()
                .filter(|session| session.kills.is_some())
                .map(Session::kd_ratio),
        )
        .map(round2),
        mood_analysis: mood_analysis(sessions),
        system_performance: system_performance(sessions),
        gaming_patterns: GamingPatterns {
            peak_gaming_hour: peak_hour(sessions),
            sessions_this_week: recent.len(),
            average_sessions_per_day: round2(recent.len() as f64 / 7.0),
        },
        recommendations: recommendations(&recent),
    }))
}

/// Compares the mean rating of the latest sessions against the ones just before.
pub fn performance_trend(sessions: &[Session]) -> Trend {
    let mut rated = sessions
        .iter()
        .filter(|session| session.performance_rating.is_some())
        .collect::<Vec<_>>();
    rated.sort_by_key(|session| session.start_time);

    let half = TREND_WINDOW.min(rated.len() / 2);
    if half < 2 {
        return Trend {
            status: TrendStatus::InsufficientData,
            message: None,
            change: None,
        };
    }

    let split = rated.len() - half;
    let previous = mean(ratings(rated[split - half..split].iter().copied())).unwrap_or(0.0);
    let latest = mean(ratings(rated[split..].iter().copied())).unwrap_or(0.0);
    let change = latest - previous;

    let (status, message) = if change > TREND_THRESHOLD {
        (
            TrendStatus::Improving,
            "Your performance is improving! Keep it up!",
        )
    } else if change < -TREND_THRESHOLD {
        (
            TrendStatus::Declining,
            "Performance seems to be declining. Consider taking a break or adjusting your approach.",
        )
    } else {
        (TrendStatus::Stable, "Your performance is stable.")
    };

    Trend {
        status,
        message: Some(message),
        change: Some(round2(change)),
    }
}

fn mood_analysis(sessions: &[Session]) -> MoodAnalysis {
    let pairs = mood_pairs(sessions.iter());
    let (Some(before), Some(after)) = (
        mean(pairs.iter().map(|(before, _)| *before)),
        mean(pairs.iter().map(|(_, after)| *after)),
    ) else {
        return MoodAnalysis::NoData {
            message: "No mood data available",
        };
    };

    let improvement = after - before;
    let impact = if improvement > TREND_THRESHOLD {
        "This game generally improves your mood!"
    } else if improvement < -TREND_THRESHOLD {
        "This game might be causing frustration. Consider taking breaks."
    } else {
        "This game has a neutral impact on your mood."
    };

    MoodAnalysis::Summary {
        average_mood_before: round2(before),
        average_mood_after: round2(after),
        mood_improvement: round2(improvement),
        impact,
    }
}

fn system_performance(sessions: &[Session]) -> SystemPerformance {
    let average_fps = mean(sessions.iter().filter_map(|session| session.avg_fps)).map(round2);
    let average_cpu_usage =
        mean(sessions.iter().filter_map(|session| session.avg_cpu_usage)).map(round2);

    let message = (average_fps.is_none() && average_cpu_usage.is_none())
        .then_some("No system performance data available");

    SystemPerformance {
        message,
        average_fps,
        average_cpu_usage,
    }
}

/// Most common start hour; the earliest hour wins a tie.
fn peak_hour(sessions: &[Session]) -> Option<String> {
    sessions
        .iter()
        .fold(BTreeMap::new(), |mut acc, session| {
            *acc.entry(session.start_time.hour()).or_insert(0_usize) += 1;
            acc
        })
        .into_iter()
        .max_by(|(left_hour, left), (right_hour, right)| {
            left.cmp(right).then(right_hour.cmp(left_hour))
        })
        .map(|(hour, _)| format!("{hour}:00"))
}

fn recommendations(recent: &[&Session]) -> Vec<String> {
    if recent.is_empty() {
        return vec![
            "Start tracking your gaming sessions to get personalized recommendations!".to_string(),
        ];
    }

    let average_duration =
        mean(recent.iter().filter_map(|session| session.duration_minutes).map(|m| m as f64))
            .unwrap_or(0.0);
    let long_sessions = (average_duration > LONG_SESSION_MINUTES).then_some(
        "Consider taking breaks during long gaming sessions to maintain peak performance.",
    );

    let mood_change = mean(
        mood_pairs(recent.iter().copied())
            .into_iter()
            .map(|(before, after)| after - before),
    );
    let negative_mood = mood_change.filter(|change| *change < -TREND_THRESHOLD).map(|_| {
        "Gaming sessions seem to be affecting your mood negatively. Consider shorter sessions or different games."
    });

    let fps_advice = mean(recent.iter().filter_map(|session| session.avg_fps)).and_then(|fps| {
        if fps < LOW_FPS {
            Some("Low FPS detected. Consider lowering graphics settings or upgrading hardware.")
        } else if fps > HIGH_FPS {
            Some("Excellent performance! Your system is running smoothly.")
        } else {
            None
        }
    });

    let advice = [long_sessions, negative_mood, fps_advice]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect::<Vec<_>>();

    if advice.is_empty() {
        vec!["Keep tracking your sessions for more personalized insights!".to_string()]
    } else {
        advice
    }
}

fn ratings<'a>(sessions: impl Iterator<Item = &'a Session>) -> impl Iterator<Item = f64> {
    sessions
        .filter_map(|session| session.performance_rating)
        .map(|rating| f64::from(rating.value()))
}

fn mood_pairs<'a>(sessions: impl Iterator<Item = &'a Session>) -> Vec<(f64, f64)> {
    sessions
        .filter_map(|session| match (session.mood_before, session.mood_after) {
            (Some(before), Some(after)) => {
                Some((f64::from(before.value()), f64::from(after.value())))
            }
            _ => None,
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
