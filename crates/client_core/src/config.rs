use std::fs;

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "calendar.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Normal,
    /// Session state lives in memory only.
    Test,
}

impl RunMode {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("test") {
            RunMode::Test
        } else {
            RunMode::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub session_database_url: String,
    pub mode: RunMode,
    pub error_clear_delay_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4000/api".into(),
            session_database_url: "sqlite://./data/session.db".into(),
            mode: RunMode::Normal,
            error_clear_delay_ms: Some(10),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    mode: Option<String>,
    session_database_url: Option<String>,
    error_clear_delay_ms: Option<u64>,
}

/// Defaults, then `calendar.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(file = SETTINGS_FILE, error = %err, "ignoring unreadable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.mode {
        settings.mode = RunMode::parse(&v);
    }
    if let Some(v) = file_cfg.session_database_url {
        settings.session_database_url = normalize_database_url(&v);
    }
    if let Some(v) = file_cfg.error_clear_delay_ms {
        settings.error_clear_delay_ms = delay_from_millis(v);
    }
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CALENDAR_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP_MODE") {
        settings.mode = RunMode::parse(&v);
    }
    if let Some(v) = lookup("APP__MODE") {
        settings.mode = RunMode::parse(&v);
    }

    if let Some(v) = lookup("SESSION_DATABASE_URL") {
        settings.session_database_url = normalize_database_url(&v);
    }
    if let Some(v) = lookup("APP__SESSION_DATABASE_URL") {
        settings.session_database_url = normalize_database_url(&v);
    }

    if let Some(v) = lookup("APP__ERROR_CLEAR_DELAY_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.error_clear_delay_ms = delay_from_millis(parsed),
            Err(err) => warn!(value = %v, error = %err, "ignoring APP__ERROR_CLEAR_DELAY_MS"),
        }
    }
}

/// Zero keeps error messages until the next auth transition.
fn delay_from_millis(ms: u64) -> Option<u64> {
    (ms > 0).then_some(ms)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().session_database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
