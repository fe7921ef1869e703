//! Error types for the test runner
//!
//! Each browser step has its own error kind so a failed run says which
//! step broke, not just that something did.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Environment Errors ===
    #[error("Browser driver '{name}' not found. Searched: {searched}")]
    DependencyMissing { name: String, searched: String },

    // === Browser Step Errors ===
    #[error("Failed to start browser session: {0}")]
    SessionStartFailed(String),

    #[error("Failed to load test page: {0}")]
    NavigationFailed(String),

    #[error("Test entry point failed: {0}")]
    ScriptExecutionFailed(String),

    #[error("Test entry point returned a malformed result: {0}")]
    MalformedResult(String),

    #[error("Failed to close browser session: {0}")]
    TeardownFailed(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a dependency missing error with the locations that were searched
    pub fn dependency_missing<S: AsRef<str>>(name: &str, searched: &[S]) -> Self {
        Self::DependencyMissing {
            name: name.to_string(),
            searched: searched
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a malformed result error
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedResult(reason.to_string())
    }

    /// Whether this error came from a step after the session was started
    pub fn is_session_step(&self) -> bool {
        matches!(
            self,
            Error::NavigationFailed(_) | Error::ScriptExecutionFailed(_) | Error::MalformedResult(_)
        )
    }
}
