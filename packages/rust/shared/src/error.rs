//! Error types for jobowners.
//!
//! Library crates use [`JobOwnersError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all jobowners operations.
#[derive(Debug, thiserror::Error)]
pub enum JobOwnersError {
    /// Configuration, credential, or owner-list error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to the CI server.
    #[error("network error: {0}")]
    Network(String),

    /// The CI server answered with a non-success status.
    #[error("remote error: HTTP {status} from {url}")]
    Remote { status: u16, url: String },

    /// Malformed response body or input data.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failure while serializing the report.
    #[error("report error: {0}")]
    Report(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JobOwnersError>;

impl JobOwnersError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
