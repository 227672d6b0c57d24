//! Schema validation helpers for LifeLight JSON5 configuration.

use crate::ConfigError;
use lifelight_rs_protocol::ReminderTime;
use serde_json::{Map, Value};

/// Validate a single config layer (or the merged result) against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "store", "scheduler", "analytics", "notifications"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("store") {
        validate_store(value, layer, "store")?;
    }
    if let Some(value) = map.get("scheduler") {
        validate_scheduler(value, layer, "scheduler")?;
    }
    if let Some(value) = map.get("analytics") {
        validate_analytics(value, layer, "analytics")?;
    }
    if let Some(value) = map.get("notifications") {
        validate_notifications(value, layer, "notifications")?;
    }
    Ok(())
}

/// Validate the "store" block.
fn validate_store(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["path", "compact_on_open"], layer, path)?;

    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("compact_on_open") {
        expect_bool(value, layer, &join_path(path, "compact_on_open"))?;
    }
    Ok(())
}

/// Validate the "scheduler" block.
fn validate_scheduler(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "enabled",
            "tick_interval_secs",
            "due_window_secs",
            "health_check_in",
        ],
        layer,
        path,
    )?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    for key in ["tick_interval_secs", "due_window_secs"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("health_check_in") {
        validate_time_of_day(value, layer, &join_path(path, "health_check_in"))?;
    }
    Ok(())
}

/// Validate the "analytics" block.
fn validate_analytics(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["window_days", "adherence_window_days"], layer, path)?;

    for key in ["window_days", "adherence_window_days"] {
        if let Some(value) = map.get(key) {
            expect_u32(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "notifications" block.
fn validate_notifications(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["buffer"], layer, path)?;

    if let Some(value) = map.get("buffer") {
        expect_u64(value, layer, &join_path(path, "buffer"))?;
    }
    Ok(())
}

/// Validate an optional `HH:MM` string.
fn validate_time_of_day(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value {
        Value::Null => Ok(()),
        Value::String(raw) => raw
            .parse::<ReminderTime>()
            .map(|_| ())
            .map_err(|_| invalid_field(layer, path, "expected time of day as HH:MM")),
        _ => Err(invalid_field(layer, path, "expected string")),
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON string or null.
fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_null() {
        return Ok(());
    }
    expect_string(value, layer, path)
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Expect a non-negative JSON integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Expect a non-negative JSON integer that fits in 32 bits.
fn expect_u32(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_u64() {
        Some(number) if u32::try_from(number).is_ok() => Ok(()),
        _ => Err(invalid_field(layer, path, "expected 32-bit non-negative integer")),
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
