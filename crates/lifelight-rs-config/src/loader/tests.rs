//! Tests for layered configuration loading.

use super::*;
use crate::StoreConfig;
use lifelight_rs_protocol::ReminderTime;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only see layers inside the given temp root.
fn isolated_options(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = Some(root.join("system.json5"));
    options.user_config_path = Some(root.join("user.json5"));
    options
}

/// Verify that an empty config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = LifeLightConfig::load_from_str("{}").expect("config");
    assert_eq!(config.scheduler.tick_interval_secs, 60);
    assert_eq!(config.scheduler.due_window_secs, 300);
    assert_eq!(config.scheduler.enabled, true);
    assert_eq!(config.analytics.window_days, 30);
    assert_eq!(config.notifications.buffer, 64);
    assert_eq!(config.store.path, None);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = LifeLightConfig::load_from_str("{ unexpected: true }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
}

/// Reject a malformed check-in time with the offending path in the message.
#[test]
fn rejects_invalid_health_check_in() {
    let err =
        LifeLightConfig::load_from_str(r#"{ scheduler: { health_check_in: "25:00" } }"#)
            .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("scheduler.health_check_in"));
}

/// Parse a valid check-in time into a reminder time.
#[test]
fn parses_health_check_in() {
    let config =
        LifeLightConfig::load_from_str(r#"{ scheduler: { health_check_in: "19:30" } }"#)
            .expect("config");
    assert_eq!(config.scheduler.health_check_in, ReminderTime::new(19, 30));
}

/// Zero-length intervals are rejected after deserialization.
#[test]
fn rejects_zero_tick_interval() {
    let err = LifeLightConfig::load_from_str("{ scheduler: { tick_interval_secs: 0 } }")
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("scheduler.tick_interval_secs"));
}

/// Negative numbers fail schema validation.
#[test]
fn rejects_negative_window() {
    let err = LifeLightConfig::load_from_str("{ analytics: { window_days: -3 } }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("analytics.window_days"));
}

/// Ensure cwd config takes precedence over user and system layers.
#[test]
fn layered_config_prefers_cwd_over_user_and_system() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &root.join("system.json5"),
        "{ scheduler: { tick_interval_secs: 10, due_window_secs: 120 } }",
    );
    write_json5(
        &root.join("user.json5"),
        "{ scheduler: { tick_interval_secs: 20 } }",
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ scheduler: { tick_interval_secs: 30 } }",
    );

    let layered =
        LifeLightConfig::load_layered_with_options(isolated_options(root, &cwd)).expect("layered");
    assert_eq!(layered.config.scheduler.tick_interval_secs, 30);
    assert_eq!(layered.config.scheduler.due_window_secs, 120);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd
        ]
    );
}

/// Runtime overrides win over every discovered layer.
#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();

    write_json5(&root.join("user.json5"), "{ store: { path: \"/tmp/user.jsonl\" } }");
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ store: { path: \"/tmp/runtime.jsonl\" } }");

    let options = isolated_options(root, root).with_runtime_path(&runtime_config);
    let layered = LifeLightConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(
        layered.config.store.path,
        Some("/tmp/runtime.jsonl".to_string())
    );
}

/// A missing runtime layer is an error, unlike discovered layers.
#[test]
fn missing_runtime_layer_fails() {
    let temp = TempDir::new().expect("tmp");
    let options =
        isolated_options(temp.path(), temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = LifeLightConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::MissingLayer(path) if path.ends_with("nope.json5")));
}

/// The same file reached through two layer slots is only applied once.
#[test]
fn duplicate_layer_paths_are_loaded_once() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let shared = root.join(DEFAULT_CONFIG_FILE);
    write_json5(&shared, "{ notifications: { buffer: 8 } }");

    let mut options = LayeredConfigOptions::new(root);
    options.system_config_path = None;
    options.user_config_path = Some(shared);
    let layered = LifeLightConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.config.notifications.buffer, 8);
}

/// An explicit store path is used verbatim.
#[test]
fn resolved_store_path_prefers_explicit_path() {
    let config = LifeLightConfig::builder()
        .store(StoreConfig {
            path: Some("/var/lib/lifelight/store.jsonl".to_string()),
            compact_on_open: false,
        })
        .build();
    assert_eq!(
        config.store.resolved_path().expect("path"),
        std::path::PathBuf::from("/var/lib/lifelight/store.jsonl")
    );
}
