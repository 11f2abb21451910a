//! Tests for bootstrap configuration loading
//!
//! Covers:
//! - Compiled defaults
//! - Partial TOML files falling back to defaults per field
//! - Explicit paths that are missing or malformed

use mnm_common::config::{default_config_paths, TomlConfig};
use mnm_common::Error;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_compiled_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.port, 8000);
    assert_eq!(config.session_ttl_secs, 600);
    assert_eq!(config.close_grace_secs, 5);
    assert_eq!(config.logging.level, "info");
    assert!(config.redis_url.is_none());
    assert_eq!(config.recommender.candidate_pool, 30);
    assert_eq!(config.recommender.top_k, 10);
    assert_eq!(config.recommender.max_distance_km, 10.0);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
        port = 9100
        redis_url = "redis://127.0.0.1/"

        [recommender]
        top_k = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.port, 9100);
    assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
    assert_eq!(config.recommender.top_k, 5);
    // Untouched fields keep compiled defaults
    assert_eq!(config.recommender.candidate_pool, 30);
    assert_eq!(config.session_ttl_secs, 600);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "session_ttl_secs = 30\n[logging]\nlevel = \"debug\"").unwrap();

    let config = TomlConfig::load(Some(file.path()), "mnm-gs").unwrap();
    assert_eq!(config.session_ttl_secs, 30);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = TomlConfig::load(Some(&missing), "mnm-gs");
    assert!(result.is_err());
}

#[test]
fn test_unreadable_file_is_an_io_error() {
    // A directory exists but cannot be read as a file
    let dir = tempfile::tempdir().unwrap();

    let result = TomlConfig::load(Some(dir.path()), "mnm-gs");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let result = TomlConfig::load(Some(file.path()), "mnm-gs");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_default_paths_are_module_specific() {
    let paths = default_config_paths("mnm-gs");
    assert!(!paths.is_empty());
    for path in paths {
        assert_eq!(path.file_name().unwrap(), "mnm-gs.toml");
    }
}
