// Harness Error Types
//
// This module defines the error types used throughout the comparison harness.

use thiserror::Error;

/// Errors that can occur while orchestrating a comparison run
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Invalid or unreadable harness configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Problem discovering or parsing a test suite file
    #[error("Suite error: {0}")]
    SuiteError(String),

    /// Failure launching or supervising a language runner process
    #[error("Runner error: {0}")]
    RunnerError(String),

    /// Problem reading or aggregating result files
    #[error("Report error: {0}")]
    ReportError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}
