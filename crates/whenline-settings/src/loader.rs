//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WhenlineSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{LOG_LEVELS, WhenlineSettings};

/// The whenline home directory (`~/.whenline`).
pub fn whenline_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".whenline")
}

/// Resolve the path to the settings file (`~/.whenline/settings.json`).
pub fn settings_path() -> PathBuf {
    whenline_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WhenlineSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or unusable values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<WhenlineSettings> {
    let defaults = serde_json::to_value(WhenlineSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: WhenlineSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut WhenlineSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

fn apply_overrides_from(settings: &mut WhenlineSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = read_string(&env, "WHENLINE_DATA_DIR") {
        settings.data_dir = v;
    }
    if let Some(v) = read_string(&env, "WHENLINE_CONTENT_REPOSITORY") {
        settings.default_content_repository = v;
    }
    if let Some(v) = read_log_level(&env, "WHENLINE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_u32(&env, "WHENLINE_POOL_SIZE", 1, 64) {
        settings.event_store.pool_size = v;
    }
    if let Some(v) = read_u32(&env, "WHENLINE_BUSY_TIMEOUT_MS", 0, 600_000) {
        settings.event_store.busy_timeout_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Normalize a log level name, `None` if it is not one of [`LOG_LEVELS`].
pub fn parse_log_level(val: &str) -> Option<String> {
    let lower = val.trim().to_lowercase();
    LOG_LEVELS.contains(&lower.as_str()).then_some(lower)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_string(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    env(name).filter(|v| !v.is_empty())
}

fn read_log_level(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    let val = env(name)?;
    let result = parse_log_level(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid log level env var, ignoring");
    }
    result
}

fn read_u32(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u32,
    max: u32,
) -> Option<u32> {
    let val = env(name)?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
