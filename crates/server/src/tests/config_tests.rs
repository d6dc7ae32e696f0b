use super::{load_settings_from, normalize_database_url, prepare_database_url, Settings};

use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, env_of(&[]));
    assert_eq!(settings, Settings::default());
    let endpoints = settings.endpoints().expect("endpoints");
    assert!(endpoints.generation_url.is_none());
}

#[test]
fn file_values_override_defaults() {
    let file = r#"
        bind_addr = "0.0.0.0:8080"
        public_url = "https://frames.example.com"
        generation_url = "https://gen.example.com/jobs"
        max_body_bytes = 1024
    "#;
    let settings = load_settings_from(Some(file), env_of(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.public_url, "https://frames.example.com");
    assert_eq!(
        settings.generation_url.as_deref(),
        Some("https://gen.example.com/jobs")
    );
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn app_env_wins_over_file_and_plain_env() {
    let file = r#"database_url = "sqlite://./from-file.db""#;
    let settings = load_settings_from(
        Some(file),
        env_of(&[
            ("DATABASE_URL", "sqlite://./plain.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
            ("APP__DERIVATIVE_OWNER", "remixer"),
            ("APP__MAX_BODY_BYTES", "not-a-number"),
        ]),
    );
    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert_eq!(settings.derivative_owner, "remixer");
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
}

#[test]
fn malformed_file_is_ignored() {
    let settings = load_settings_from(Some("bind_addr = "), env_of(&[]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn blank_generation_url_means_no_endpoint() {
    let settings = load_settings_from(None, env_of(&[("APP__GENERATION_URL", "  ")]));
    assert!(settings.endpoints().expect("endpoints").generation_url.is_none());
}

#[test]
fn invalid_urls_are_reported() {
    let settings = load_settings_from(None, env_of(&[("APP__PUBLIC_URL", "not a url")]));
    let err = settings.endpoints().expect_err("should fail");
    assert!(err.to_string().contains("public_url"));
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data/test.db"),
        "sqlite://data/test.db"
    );
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("artcast.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(temp_root.path().join("nested").exists());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
