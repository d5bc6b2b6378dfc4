//! Integration tests for configuration loading
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that touch CORPMATCH_* variables are marked with #[serial].

use corpmatch_common::config::{
    load_config, read_toml_config, resolve_config_path, write_toml_config, BATCH_SIZE_ENV,
    CONFIG_PATH_ENV, FUZZY_THRESHOLD_ENV, WORKERS_ENV,
};
use corpmatch_common::{Error, TomlConfig};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_PATH_ENV);
    env::remove_var(FUZZY_THRESHOLD_ENV);
    env::remove_var(WORKERS_ENV);
    env::remove_var(BATCH_SIZE_ENV);
}

#[test]
fn test_write_then_read_preserves_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.resolver.fuzzy_match_threshold = 88;
    config.resolver.source_confidence.discovery = 40;
    config.logging.level = "debug".to_string();

    write_toml_config(&config, &path).unwrap();
    let loaded = read_toml_config(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_malformed_file_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[resolver\nfuzzy_match_threshold = ").unwrap();

    let result = read_toml_config(&path);
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let explicit = temp_dir.path().join("explicit.toml");
    env::set_var(CONFIG_PATH_ENV, temp_dir.path().join("env.toml"));

    let resolved = resolve_config_path(Some(&explicit));
    assert_eq!(resolved, Some(explicit));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_when_no_explicit_path() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("env.toml");
    std::fs::write(&path, "[resolver]\nworkers = 2\n").unwrap();
    env::set_var(CONFIG_PATH_ENV, &path);

    let config = load_config(None).unwrap();
    assert_eq!(config.resolver.workers, 2);

    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_config_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let result = load_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[resolver]\nfuzzy_match_threshold = 80\nworkers = 2\nbatch_size = 10\n",
    )
    .unwrap();

    env::set_var(FUZZY_THRESHOLD_ENV, "92");
    env::set_var(BATCH_SIZE_ENV, "250");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.resolver.fuzzy_match_threshold, 92);
    assert_eq!(config.resolver.workers, 2);
    assert_eq!(config.resolver.batch_size, 250);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_override_is_rejected() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    env::set_var(WORKERS_ENV, "many");
    let result = load_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));

    env::set_var(WORKERS_ENV, "0");
    let result = load_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}
