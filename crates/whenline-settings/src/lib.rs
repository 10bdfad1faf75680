//! # whenline-settings
//!
//! Layered configuration for whenline.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WhenlineSettings::default()`]
//! 2. **User file**: `~/.whenline/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WHENLINE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
    whenline_home,
};
pub use types::*;
