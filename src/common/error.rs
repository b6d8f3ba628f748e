//! Error types for the harness
//!
//! Everything in [`Error`] is a configuration-level failure: the suite
//! cannot run at all. Per-fixture problems never surface here, they become
//! verdicts (see [`crate::harness::RunFailure`]).

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Fixture Errors ===
    #[error("Cannot read fixture directory '{path}': {source}")]
    FixtureDirUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid fixture naming: {0}")]
    InvalidNaming(String),

    // === Target Errors ===
    #[error("Target program '{program}' not usable: {reason}")]
    TargetNotFound { program: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a fixture directory error from the failing IO operation
    pub fn fixture_dir(path: &Path, source: io::Error) -> Self {
        Self::FixtureDirUnreadable {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a target not found error
    pub fn target_not_found(program: &Path, reason: impl Into<String>) -> Self {
        Self::TargetNotFound {
            program: program.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create a config parse error
    pub fn config_parse(path: &Path, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
