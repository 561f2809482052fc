use crate::analyzer::{self, OverallStats, performance::GameAnalytics};
use crate::config::Config;
use crate::db::Database;
use crate::error::TrackerError;
use crate::games;
use crate::model::{Game, GameInput, Schedule, ScheduleDraft, Session, SessionUpdate};
use crate::monitor::{self, SystemInfo, SystemMetrics};
use crate::planner::advice::{self, ScheduleStats};
use crate::planner::schedules;
use crate::sessions;
use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

impl ApiState {
    fn database(&self) -> anyhow::Result<Database> {
        Database::open(&self.config.db_path)
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/games", get(game_list).post(game_create))
        .route("/api/games/genres", get(game_genres))
        .route("/api/games/platforms", get(game_platforms))
        .route("/api/games/most-played", get(game_most_played))
        .route("/api/games/genre/:genre", get(games_by_genre))
        .route("/api/games/platform/:platform", get(games_by_platform))
        .route(
            "/api/games/:id",
            get(game_get).put(game_update).delete(game_delete),
        )
        .route("/api/sessions/start/:game_id", post(session_start))
        .route("/api/sessions/end/:id", post(session_end))
        .route("/api/sessions/active", get(session_active))
        .route("/api/sessions/game/:game_id", get(session_list_for_game))
        .route("/api/sessions/recent/:days", get(session_recent))
        .route("/api/sessions/analytics/overall", get(overall_analytics))
        .route(
            "/api/sessions/:id",
            get(session_get).put(session_update).delete(session_delete),
        )
        .route("/api/schedules", get(schedule_upcoming).post(schedule_create))
        .route("/api/schedules/today", get(schedule_today))
        .route("/api/schedules/week", get(schedule_week))
        .route("/api/schedules/analytics", get(schedule_analytics))
        .route(
            "/api/schedules/recommendations",
            get(schedule_recommendations),
        )
        .route(
            "/api/schedules/:id",
            put(schedule_update).delete(schedule_delete),
        )
        .route("/api/schedules/:id/complete", post(schedule_complete))
        .route("/api/schedules/:id/conflicts", get(schedule_conflicts))
        .route("/api/analytics/game/:game_id", get(game_analytics))
        .route("/api/analytics/overall", get(overall_analytics))
        .route("/api/system/metrics", get(system_metrics))
        .route("/api/system/info", get(system_info))
        .route(
            "/api/system/recommendations",
            get(system_recommendations),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    api_port: u16,
    db_path: String,
    games: usize,
    active_sessions: usize,
    upcoming_schedules: usize,
    last_session_started_at: Option<NaiveDateTime>,
    reminder_interval_minutes: u64,
    reminders_enabled: bool,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = state.database()?;

    Ok(Json(StatusPayload {
        api_port: state.config.api_port,
        db_path: state.config.db_path.display().to_string(),
        games: database.list_games()?.len(),
        active_sessions: database.active_sessions()?.len(),
        upcoming_schedules: schedules::upcoming_schedules(&database)?.len(),
        last_session_started_at: database.latest_session_start()?,
        reminder_interval_minutes: state.config.reminder_interval_minutes,
        reminders_enabled: state.config.reminder_notify,
    }))
}

async fn game_list(State(state): State<ApiState>) -> ApiResult<Json<Vec<Game>>> {
    Ok(Json(games::list_games(&state.database()?)?))
}

async fn game_create(
    State(state): State<ApiState>,
    Json(input): Json<GameInput>,
) -> ApiResult<(StatusCode, Json<Game>)> {
    let game = games::create_game(&state.database()?, input, now())?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn game_get(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<Json<Game>> {
    Ok(Json(games::get_game(&state.database()?, id)?))
}

async fn game_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(input): Json<GameInput>,
) -> ApiResult<Json<Game>> {
    Ok(Json(games::update_game(&state.database()?, id, input)?))
}

async fn game_delete(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    games::delete_game(&state.database()?, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn games_by_genre(
    State(state): State<ApiState>,
    Path(genre): Path<String>,
) -> ApiResult<Json<Vec<Game>>> {
    Ok(Json(games::games_by_genre(&state.database()?, &genre)?))
}

async fn games_by_platform(
    State(state): State<ApiState>,
    Path(platform): Path<String>,
) -> ApiResult<Json<Vec<Game>>> {
    Ok(Json(games::games_by_platform(&state.database()?, &platform)?))
}

async fn game_genres(State(state): State<ApiState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(games::genres(&state.database()?)?))
}

async fn game_platforms(State(state): State<ApiState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(games::platforms(&state.database()?)?))
}

async fn game_most_played(State(state): State<ApiState>) -> ApiResult<Json<Vec<Game>>> {
    Ok(Json(games::most_played_games(&state.database()?)?))
}

async fn session_start(
    State(state): State<ApiState>,
    Path(game_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let metrics = monitor::sample_metrics().await?;
    let session =
        sessions::start_session(&state.database()?, game_id, &metrics.snapshot(), now())?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn session_end(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<Json<Session>> {
    Ok(Json(sessions::end_session(&state.database()?, id, now())?))
}

async fn session_get(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<Json<Session>> {
    Ok(Json(sessions::get_session(&state.database()?, id)?))
}

async fn session_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(update): Json<SessionUpdate>,
) -> ApiResult<Json<Session>> {
    Ok(Json(sessions::update_session_stats(
        &state.database()?,
        id,
        update,
    )?))
}

async fn session_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    sessions::delete_session(&state.database()?, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn session_list_for_game(
    State(state): State<ApiState>,
    Path(game_id): Path<i64>,
) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(sessions::sessions_for_game(&state.database()?, game_id)?))
}

async fn session_active(State(state): State<ApiState>) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(sessions::active_sessions(&state.database()?)?))
}

async fn session_recent(
    State(state): State<ApiState>,
    Path(days): Path<i64>,
) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(sessions::recent_sessions(
        &state.database()?,
        days,
        now(),
    )?))
}

async fn schedule_upcoming(State(state): State<ApiState>) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(schedules::upcoming_schedules(&state.database()?)?))
}

async fn schedule_today(State(state): State<ApiState>) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(schedules::schedules_for_today(
        &state.database()?,
        now(),
    )?))
}

async fn schedule_week(State(state): State<ApiState>) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(schedules::schedules_for_week(&state.database()?, now())?))
}

async fn schedule_create(
    State(state): State<ApiState>,
    Json(draft): Json<ScheduleDraft>,
) -> ApiResult<(StatusCode, Json<Schedule>)> {
    let schedule = schedules::create_schedule(&state.database()?, draft, now())?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn schedule_update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(draft): Json<ScheduleDraft>,
) -> ApiResult<Json<Schedule>> {
    Ok(Json(schedules::update_schedule(&state.database()?, id, draft)?))
}

async fn schedule_complete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Schedule>> {
    Ok(Json(schedules::complete_schedule(&state.database()?, id)?))
}

async fn schedule_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    schedules::delete_schedule(&state.database()?, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn schedule_conflicts(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(schedules::schedule_conflicts(&state.database()?, id)?))
}

async fn schedule_analytics(State(state): State<ApiState>) -> ApiResult<Json<ScheduleStats>> {
    Ok(Json(advice::schedule_stats(&state.database()?, now())?))
}

async fn schedule_recommendations(State(state): State<ApiState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(advice::recommendations(&state.database()?, now())?))
}

async fn game_analytics(
    State(state): State<ApiState>,
    Path(game_id): Path<i64>,
) -> ApiResult<Json<GameAnalytics>> {
    Ok(Json(analyzer::game_report(
        &state.database()?,
        game_id,
        now(),
    )?))
}

async fn overall_analytics(State(state): State<ApiState>) -> ApiResult<Json<OverallStats>> {
    Ok(Json(analyzer::overall_stats(&state.database()?, now())?))
}

async fn system_metrics() -> ApiResult<Json<SystemMetrics>> {
    Ok(Json(monitor::sample_metrics().await?))
}

async fn system_info() -> ApiResult<Json<SystemInfo>> {
    let info = tokio::task::spawn_blocking(monitor::system_info)
        .await
        .context("System info task failed")?;
    Ok(Json(info))
}

async fn system_recommendations() -> ApiResult<Json<BTreeMap<String, String>>> {
    let metrics = monitor::sample_metrics().await?;
    Ok(Json(monitor::optimization_recommendations(&metrics)))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Conflict { message: String, conflicts: usize },
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        match value.downcast_ref::<TrackerError>() {
            Some(error) if error.is_not_found() => Self::NotFound(error.to_string()),
            Some(error @ TrackerError::ScheduleConflict { count }) => Self::Conflict {
                message: error.to_string(),
                conflicts: *count,
            },
            Some(error) => Self::BadRequest(error.to_string()),
            None => Self::Internal(value),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Conflict { message, conflicts } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message, "conflicts": conflicts })),
            )
                .into_response(),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => {
                tracing::error!(error = %format!("{error:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiState, router};
    use crate::config::Config;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            db_path: dir.path().join("tracker.db"),
            ..Config::default()
        };
        let app = router(ApiState {
            config: Arc::new(config),
        });
        (app, dir)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |value| Body::from(value.to_string())))
            .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, value)
    }

    #[tokio::test]
    async fn game_crud_round_trip() {
        let (app, _dir) = app();

        let (status, created) = send(
            &app,
            "POST",
            "/api/games",
            Some(json!({"name": "Elden Ring", "genre": "RPG", "platform": "PC"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().expect("id");

        let (status, body) = send(
            &app,
            "POST",
            "/api/games",
            Some(json!({"name": "elden ring", "genre": "RPG"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Game with name 'elden ring' already exists");

        let (status, genres) = send(&app, "GET", "/api/games/genres", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(genres, json!(["RPG"]));

        let (status, _) = send(&app, "DELETE", &format!("/api/games/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &format!("/api/games/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("Game not found with id: {id}"));
    }

    #[tokio::test]
    async fn overlapping_schedule_reports_conflict_count() {
        let (app, _dir) = app();
        let slot = json!({
            "title": "Raid",
            "scheduled_time": "2099-01-05T20:00:00",
            "estimated_duration_minutes": 90,
            "type": "group_event"
        });

        let (status, created) = send(&app, "POST", "/api/schedules", Some(slot)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["type"], "group_event");
        assert_eq!(created["reminder_sent"], false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/schedules",
            Some(json!({"title": "Dungeon", "scheduled_time": "2099-01-05T19:30:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["conflicts"], 1);
        assert_eq!(body["error"], "Schedule conflicts with existing sessions");

        let (status, upcoming) = send(&app, "GET", "/api/schedules", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(upcoming.as_array().map(Vec::len), Some(1));

        let (status, stats) = send(&app, "GET", "/api/schedules/analytics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["upcoming_count"], 1);
        assert_eq!(stats["type_distribution"]["group_event"], 1);
    }

    #[tokio::test]
    async fn schedule_for_unknown_game_is_not_found() {
        let (app, _dir) = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/schedules",
            Some(json!({
                "title": "Ghost",
                "scheduled_time": "2099-01-05T20:00:00",
                "game_id": 999
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Game not found with id: 999");

        let (status, body) = send(
            &app,
            "POST",
            "/api/schedules",
            Some(json!({
                "title": "Endless",
                "scheduled_time": "2099-01-05T20:00:00",
                "estimated_duration_minutes": 200_000_000_000_i64
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|message| message.starts_with("Invalid estimated_duration_minutes"))
        );
    }

    #[tokio::test]
    async fn session_lifecycle_over_http() {
        let (app, _dir) = app();
        let (_, game) = send(
            &app,
            "POST",
            "/api/games",
            Some(json!({"name": "Tekken 8", "genre": "Fighting"})),
        )
        .await;
        let game_id = game["id"].as_i64().expect("game id");

        let (status, session) =
            send(&app, "POST", &format!("/api/sessions/start/{game_id}"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let session_id = session["id"].as_i64().expect("session id");

        let (status, body) =
            send(&app, "POST", &format!("/api/sessions/start/{game_id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            format!("There's already an active session for game {game_id}")
        );

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{session_id}"),
            Some(json!({"kills": 7, "performance_rating": "good"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["kills"], 7);

        let (status, ended) = send(&app, "POST", &format!("/api/sessions/end/{session_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(ended["end_time"].is_string());

        let (status, _) = send(&app, "POST", &format!("/api/sessions/end/{session_id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, analytics) =
            send(&app, "GET", &format!("/api/analytics/game/{game_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(analytics["total_sessions"], 1);
    }

    #[tokio::test]
    async fn empty_store_recommends_planning_and_reports_status() {
        let (app, _dir) = app();

        let (status, advice) = send(&app, "GET", "/api/schedules/recommendations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            advice,
            json!([
                "No upcoming gaming sessions scheduled. Plan your gaming time to maintain consistency!"
            ])
        );

        let (status, body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["games"], 0);
        assert_eq!(body["api_port"], 8080);

        let (status, _) = send(&app, "DELETE", "/api/schedules/12", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
