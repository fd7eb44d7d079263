//! Error types for the entry driver.
//!
//! Per-entry errors (missing commit, missing repo) are reported and the batch
//! moves on. Pre-flight errors (runtime unreachable, image build failure,
//! missing input file) abort the run before any entry is processed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or launching benchmark entries.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("No commit hash found in entry {index}")]
    MissingCommit { index: usize },

    #[error("No repository reference found in entry {index}")]
    MissingRepo { index: usize },

    #[error("Container runtime '{runtime}' is not accessible: {reason}")]
    RuntimeUnavailable { runtime: String, reason: String },

    #[error("Failed to build image '{image}': {reason}")]
    BuildFailed { image: String, reason: String },

    #[error("Failed to stage toolkit directory '{}': {reason}", path.display())]
    ToolkitStaging { path: PathBuf, reason: String },

    #[error("Data file not found: {}", .0.display())]
    DataFileNotFound(PathBuf),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while decoding a `FAIL_TO_PASS` value.
///
/// These never abort an entry: the driver logs them and falls back to the
/// generic test invocation.
#[derive(Debug, Error)]
pub enum FailingTestsError {
    #[error("invalid JSON list '{raw}': {source}")]
    InvalidList {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("list element {position} is not a string")]
    NonStringElement { position: usize },

    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),
}

/// Convenience alias for driver results.
pub type DriverResult<T> = Result<T, DriverError>;
