//! Tests for config module

use mailbrief::config::Config;
use mailbrief::error::{ErrorCategory, MailbriefErrorTrait};
use mailbrief::parser::ParserKind;
use serial_test::serial;
use std::path::{Path, PathBuf};

const ENV_VARS: &[&str] = &[
    "MAILBRIEF_SQLITE_PATH",
    "MAILBRIEF_MAX_MESSAGES",
    "MAILBRIEF_DRY_RUN",
    "MAILBRIEF_LOG_LEVEL",
    "MAILBRIEF_LOG_FORMAT",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(config_path.exists(), "config.toml should exist in project root");
}

#[test]
fn test_config_toml_loads_and_validates() {
    let config = Config::from_file(Path::new("config.toml")).expect("config.toml should parse");
    config.validate().expect("config.toml should be valid");

    assert_eq!(config.storage.sqlite_path, PathBuf::from("data/mailbrief.db"));
    assert_eq!(config.ingest.max_messages, 500);
    assert_eq!(config.sources.len(), 3);
    assert_eq!(config.sources[1].kind, ParserKind::Sectioned);
}

#[test]
fn test_config_toml_sources_route() {
    let config = Config::from_file(Path::new("config.toml")).unwrap();
    let registry = config.registry().unwrap();

    let lenny = registry.find_parser("Lenny <lenny@substack.com>").unwrap();
    assert_eq!(lenny.source, "Lenny's Newsletter");
    assert_eq!(lenny.parser.name(), "BlogParser");

    // Built-ins are still registered ahead of configured sources
    let tldr = registry.find_parser("dan@tldrnewsletter.com").unwrap();
    assert_eq!(tldr.source, "TLDR");
}

#[test]
fn test_missing_config_file_is_error() {
    let err = Config::from_file(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
    assert_eq!(err.category(), ErrorCategory::Config);
}

#[test]
fn test_malformed_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[ingest\nmax_messages = ").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML config file"));
    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config.storage.sqlite_path, PathBuf::from("data/mailbrief.db"));
    assert_eq!(config.ingest.max_messages, 500);
    assert!(!config.ingest.dry_run);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("MAILBRIEF_SQLITE_PATH", "/tmp/brief.db");
    std::env::set_var("MAILBRIEF_MAX_MESSAGES", "25");
    std::env::set_var("MAILBRIEF_DRY_RUN", "true");
    std::env::set_var("MAILBRIEF_LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.storage.sqlite_path, PathBuf::from("/tmp/brief.db"));
    assert_eq!(config.ingest.max_messages, 25);
    assert!(config.ingest.dry_run);
    assert_eq!(config.logging.format, "json");
}

#[test]
#[serial]
fn test_from_env_ignores_unparseable_numbers() {
    clear_env();
    std::env::set_var("MAILBRIEF_MAX_MESSAGES", "lots");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.ingest.max_messages, 500);
}
