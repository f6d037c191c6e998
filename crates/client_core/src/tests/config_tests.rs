use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_api() {
    let settings = Settings::default();
    assert_eq!(settings.api_url, "http://localhost:4000/api");
    assert_eq!(settings.mode, RunMode::Normal);
    assert_eq!(settings.error_clear_delay_ms, Some(10));
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/session.db"),
        "sqlite://./data/session.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\session.db"),
        "sqlite://data/session.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("  "),
        Settings::default().session_database_url
    );
}

#[test]
fn file_overrides_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
api_url = "https://calendar.example.com/api"
mode = "test"
session_database_url = "./state/session.db"
error_clear_delay_ms = 250
"#,
    );

    assert_eq!(
        settings,
        Settings {
            api_url: "https://calendar.example.com/api".into(),
            session_database_url: "sqlite://./state/session.db".into(),
            mode: RunMode::Test,
            error_clear_delay_ms: Some(250),
        }
    );
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, "api_url = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("CALENDAR_API_URL", "http://plain/api"),
            ("APP__API_URL", "http://prefixed/api"),
            ("APP_MODE", "TEST"),
        ]),
    );

    assert_eq!(settings.api_url, "http://prefixed/api");
    assert_eq!(settings.mode, RunMode::Test);
}

#[test]
fn env_overrides_file() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, r#"api_url = "http://file/api""#);
    apply_env_overrides(
        &mut settings,
        env(&[
            ("CALENDAR_API_URL", "http://env/api"),
            ("SESSION_DATABASE_URL", "sqlite::memory:"),
        ]),
    );

    assert_eq!(settings.api_url, "http://env/api");
    assert_eq!(settings.session_database_url, "sqlite::memory:");
}

#[test]
fn zero_delay_disables_auto_clear() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, env(&[("APP__ERROR_CLEAR_DELAY_MS", "0")]));
    assert_eq!(settings.error_clear_delay_ms, None);
}

#[test]
fn unparsable_delay_keeps_previous_value() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, env(&[("APP__ERROR_CLEAR_DELAY_MS", "soon")]));
    assert_eq!(settings.error_clear_delay_ms, Some(10));
}

#[test]
fn unknown_mode_falls_back_to_normal() {
    assert_eq!(RunMode::parse("production"), RunMode::Normal);
    assert_eq!(RunMode::parse(" Test "), RunMode::Test);
}
