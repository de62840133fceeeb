mod common;

use common::{create_encrypted_pdf, create_test_pdf, source};
use pdf_merge::*;
use std::time::Duration;

#[test]
fn test_default_settings_are_valid() {
    let settings = BoardSettings::default();
    settings.validate().unwrap();
    assert_eq!(settings.theme, Theme::Light);

    let options = settings.thumbnail.options();
    assert_eq!(options.width, 120);
    assert_eq!(options.retry.max_attempts, 3);
    assert_eq!(options.retry.backoff_unit, Duration::from_millis(250));
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut settings = BoardSettings::default();
    settings.thumbnail.max_attempts = 0;
    assert!(matches!(settings.validate(), Err(MergeError::Config(_))));

    let mut settings = BoardSettings::default();
    settings.preview.viewport_fraction = 1.5;
    assert!(settings.validate().is_err());
}

#[tokio::test]
async fn test_settings_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = BoardSettings::default();
    settings.theme = Theme::Dark;
    settings.thumbnail.backoff_ms = 100;
    settings.save(&path).await.unwrap();

    let loaded = BoardSettings::load(&path).await.unwrap();
    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_partial_settings_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, r#"{ "theme": "Dark" }"#).await.unwrap();

    let loaded = BoardSettings::load(&path).await.unwrap();
    assert_eq!(loaded.theme, Theme::Dark);
    assert_eq!(loaded.thumbnail, ThumbnailSettings::default());
}

#[test]
fn test_json_preference_store_persists_theme() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonPreferenceStore::new(dir.path().join("nested").join("settings.json"));

    assert!(store.load().unwrap().is_none());

    let settings = BoardSettings {
        theme: Theme::Dark,
        ..Default::default()
    };
    store.save(&settings).unwrap();
    assert_eq!(store.load().unwrap().unwrap().theme, Theme::Dark);
}

#[test]
fn test_memory_preference_store() {
    let store = MemoryPreferenceStore::default();
    assert!(store.load().unwrap().is_none());
    store.save(&BoardSettings::default()).unwrap();
    assert!(store.load().unwrap().is_some());
}

#[test]
fn test_theme_toggle() {
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
}

#[test]
fn test_validate_source_checks() {
    validate_source(&source("A", 1), DEFAULT_MAX_FILE_BYTES).unwrap();

    let too_big = source("A", 1);
    assert!(matches!(
        validate_source(&too_big, 10),
        Err(MergeError::InvalidInput { .. })
    ));

    let empty = SourceFile::new("empty.pdf", Vec::new());
    assert!(validate_source(&empty, DEFAULT_MAX_FILE_BYTES).is_err());
}

#[test]
fn test_inspect_reports_page_count() {
    let file = SourceFile::new("doc.pdf", create_test_pdf("D", 3));
    let info = inspect_pdf(&file).unwrap();
    assert_eq!(info.page_count, 3);
    assert_eq!(info.version, "1.7");
    assert!(!info.encrypted);
    assert_eq!(info.size_bytes, file.size);
}

#[test]
fn test_inspect_reports_password_protected_file() {
    let file = SourceFile::new("locked.pdf", create_encrypted_pdf("L", 2, "secret", "owner"));
    let info = inspect_pdf(&file).unwrap();
    assert!(info.encrypted);
    assert_eq!(info.size_bytes, file.size);
}

#[test]
fn test_encrypted_error_gets_distinct_notice() {
    let err = MergeError::Encrypted {
        name: "secret.pdf".to_string(),
    };
    let notice = Notice::from(&err);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("password-protected"));
}
