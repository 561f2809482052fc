use thiserror::Error;

/// Domain failures the API reports back to the caller as 4xx responses.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Game with name '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("There's already an active session for game {game_id}")]
    ActiveSessionExists { game_id: i64 },

    #[error("Session {session_id} is already ended")]
    SessionAlreadyEnded { session_id: i64 },

    #[error("Schedule conflicts with existing sessions")]
    ScheduleConflict { count: usize },
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound { .. })
    }
}
