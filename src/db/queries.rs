pub const CREATE_GAMES: &str = r#"
CREATE TABLE IF NOT EXISTS games (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  name       TEXT NOT NULL,
  genre      TEXT NOT NULL,
  platform   TEXT,
  created_at TEXT NOT NULL
);
"#;

pub const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
  id                 INTEGER PRIMARY KEY AUTOINCREMENT,
  game_id            INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
  start_time         TEXT NOT NULL,
  end_time           TEXT,
  duration_minutes   INTEGER,
  kills              INTEGER,
  deaths             INTEGER,
  assists            INTEGER,
  accuracy           REAL,
  score              INTEGER,
  avg_fps            REAL,
  avg_cpu_usage      REAL,
  avg_gpu_usage      REAL,
  avg_memory_usage   REAL,
  avg_temperature    REAL,
  mood_before        INTEGER,
  mood_after         INTEGER,
  performance_rating INTEGER,
  notes              TEXT
);
"#;

pub const CREATE_SCHEDULES: &str = r#"
CREATE TABLE IF NOT EXISTS schedules (
  id                         INTEGER PRIMARY KEY AUTOINCREMENT,
  title                      TEXT NOT NULL,
  game_id                    INTEGER REFERENCES games(id) ON DELETE SET NULL,
  scheduled_time             TEXT NOT NULL,
  estimated_duration_minutes INTEGER,
  type                       TEXT NOT NULL DEFAULT 'one_time',
  day_of_week                INTEGER,
  description                TEXT,
  is_completed               INTEGER NOT NULL DEFAULT 0,
  reminder_sent              INTEGER NOT NULL DEFAULT 0,
  created_at                 TEXT NOT NULL
);
"#;

pub const INDEX_GAMES_NAME: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_games_name ON games(name COLLATE NOCASE);";

pub const INDEX_SESSIONS_GAME: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_game_id ON sessions(game_id);";

pub const INDEX_SESSIONS_ONE_ACTIVE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active ON sessions(game_id) WHERE end_time IS NULL;";

pub const INDEX_SESSIONS_START_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);";

pub const INDEX_SCHEDULES_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_schedules_scheduled_time ON schedules(scheduled_time);";

pub const GAME_COLUMNS: &str = "id, name, genre, platform, created_at";

pub const SESSION_COLUMNS: &str = "id, game_id, start_time, end_time, duration_minutes, kills, deaths, assists, accuracy, score, avg_fps, avg_cpu_usage, avg_gpu_usage, avg_memory_usage, avg_temperature, mood_before, mood_after, performance_rating, notes";

pub const SCHEDULE_COLUMNS: &str = "id, title, game_id, scheduled_time, estimated_duration_minutes, type, day_of_week, description, is_completed, reminder_sent, created_at";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_GAMES,
        CREATE_SESSIONS,
        CREATE_SCHEDULES,
        INDEX_GAMES_NAME,
        INDEX_SESSIONS_GAME,
        INDEX_SESSIONS_ONE_ACTIVE,
        INDEX_SESSIONS_START_TIME,
        INDEX_SCHEDULES_TIME,
    ]
}
