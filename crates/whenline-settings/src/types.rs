//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values. `#[serde(default)]` lets a settings
//! file name only the fields it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "dataDir": "/var/lib/whenline",
///   "defaultContentRepository": "default",
///   "logging": { "level": "debug" },
///   "eventStore": { "poolSize": 2 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhenlineSettings {
    /// Settings schema version.
    pub version: String,
    /// Root directory for per-repository state and event logs.
    /// Relative paths resolve against `~/.whenline`.
    pub data_dir: String,
    /// Content repository used when none is given on the command line.
    pub default_content_repository: String,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Event log connection settings.
    pub event_store: EventStoreSettings,
}

impl Default for WhenlineSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            data_dir: "data".to_string(),
            default_content_repository: "default".to_string(),
            logging: LoggingSettings::default(),
            event_store: EventStoreSettings::default(),
        }
    }
}

impl WhenlineSettings {
    /// Resolve `data_dir` against `home` when it is relative.
    #[must_use]
    pub fn resolve_data_dir(&self, home: &Path) -> PathBuf {
        let dir = Path::new(&self.data_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            home.join(dir)
        }
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.default_content_repository.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "defaultContentRepository must not be empty".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(SettingsError::InvalidValue(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join("/"),
                self.logging.level
            )));
        }
        if self.event_store.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "eventStore.poolSize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Event log connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventStoreSettings {
    /// Maximum number of pooled `SQLite` connections.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for EventStoreSettings {
    fn default() -> Self {
        Self {
            pool_size: 4,
            busy_timeout_ms: 30_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
