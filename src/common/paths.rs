//! Configuration file locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/fixture-harness/`
//! - macOS: `~/Library/Application Support/fixture-harness/`
//! - Windows: `%APPDATA%\fixture-harness\`

use std::path::PathBuf;

/// Application name used for per-user directories
const APP_NAME: &str = "fixture-harness";

/// Name of the per-suite config file looked up inside a fixture directory
pub const SUITE_CONFIG_NAME: &str = "harness.toml";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
