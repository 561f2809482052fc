use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".GameTracker";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_port: u16,
    pub db_path: PathBuf,
    pub reminder_interval_minutes: u64,
    pub reminder_notify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 8080,
            db_path: default_root_dir().join("db").join("gametracker.db"),
            reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
            reminder_notify: true,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        default_root_dir().join(CONFIG_FILE)
    }

    /// Reads the config file, falling back to defaults when it does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.reminder_interval_minutes = config.reminder_interval_minutes.max(1);

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "db_path" => {
                if value.trim().is_empty() {
                    bail!("db_path must not be empty");
                }
                self.db_path = expand_home(value.trim());
            }
            "reminder_interval_minutes" => {
                let minutes = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("reminder_interval_minutes must be a number"))?;
                if minutes == 0 {
                    bail!("reminder_interval_minutes must be at least 1");
                }
                self.reminder_interval_minutes = minutes;
            }
            "reminder_notify" => {
                self.reminder_notify = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("reminder_notify must be true/false"))?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: api_port|api.port, db_path|db.path, reminder_interval_minutes|reminder.interval_minutes, reminder_notify|reminder.notify"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "api_port" => Some(self.api_port.to_string()),
            "db_path" => Some(self.db_path.display().to_string()),
            "reminder_interval_minutes" => Some(self.reminder_interval_minutes.to_string()),
            "reminder_notify" => Some(self.reminder_notify.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "api_port" | "api.port" => "api_port",
        "db_path" | "db.path" => "db_path",
        "reminder_interval_minutes" | "reminder.interval_minutes" => "reminder_interval_minutes",
        "reminder_notify" | "reminder.notify" => "reminder_notify",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
