//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, SUITE_CONFIG_NAME};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Fixture naming convention
    #[serde(default)]
    pub fixtures: FixturesConfig,

    /// Execution settings
    #[serde(default)]
    pub run: RunConfig,

    /// Output comparison settings
    #[serde(default)]
    pub compare: CompareConfig,

    /// Report rendering settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Fixture naming convention
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FixturesConfig {
    /// Suffix identifying input files
    #[serde(default = "default_input_suffix")]
    pub input_suffix: String,

    /// Suffix identifying expected-output files
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            input_suffix: default_input_suffix(),
            output_suffix: default_output_suffix(),
        }
    }
}

fn default_input_suffix() -> String {
    ".input".to_string()
}
fn default_output_suffix() -> String {
    ".output".to_string()
}

/// Execution settings
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Per-fixture timeout in seconds, 0 disables it
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum fixtures executed at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Whole-suite timeout in seconds, absent or 0 disables it
    #[serde(default)]
    pub suite_timeout_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            jobs: default_jobs(),
            suite_timeout_secs: None,
        }
    }
}

fn default_timeout() -> u64 {
    10
}
fn default_jobs() -> usize {
    1
}

/// Output comparison settings
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CompareConfig {
    /// Ignore trailing newlines when comparing
    #[serde(default = "default_trailing_newline")]
    pub trailing_newline: bool,

    /// Maximum number of differing lines shown per failure
    #[serde(default = "default_max_diff_lines")]
    pub max_diff_lines: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            trailing_newline: default_trailing_newline(),
            max_diff_lines: default_max_diff_lines(),
        }
    }
}

fn default_trailing_newline() -> bool {
    true
}
fn default_max_diff_lines() -> usize {
    20
}

/// Report format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One human-readable line per fixture
    #[default]
    Text,
    /// Newline-delimited JSON events
    Json,
}

/// Report rendering settings
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// Force colour on or off; unset means "when stdout is a terminal"
    #[serde(default)]
    pub color: Option<bool>,
}

impl Config {
    /// Load configuration
    ///
    /// Lookup order: the explicit path, then `harness.toml` inside the
    /// fixture directory, then the user config file. An explicit path that
    /// does not exist is an error; the others fall back to defaults.
    pub fn load(explicit: Option<&Path>, fixture_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Self::load_from(path);
        }

        let suite_config = fixture_dir.join(SUITE_CONFIG_NAME);
        if suite_config.is_file() {
            return Self::load_from(&suite_config);
        }

        if let Some(path) = config_path() {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| Error::config_parse(path, e))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Default fixture directory when none is given on the command line
    pub fn default_fixture_dir() -> PathBuf {
        PathBuf::from("tests")
    }
}
