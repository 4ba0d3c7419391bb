/// Error types for textscout.
///
/// Only faults that stop a run (or stop it from starting) travel through
/// [`SearchError`]. Problems with individual files are recovered by the worker
/// that hit them and stored as [`Outcome::Error`](crate::results::Outcome)
/// entries instead, so a single unreadable file never aborts a search:
///
/// ```rust,ignore
/// match textscout::search(&config) {
///     Ok(output) => // outcomes include per-file errors,
///     Err(SearchError::EmptySearchText) => // nothing to do,
///     Err(e) => // the run itself failed,
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while configuring or running a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Search text is empty")]
    EmptySearchText,
    #[error("Failed to spawn {name}: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("Thread panicked: {0}")]
    ThreadPanicked(String),
    #[error("Work queue acknowledged more items than were pushed")]
    QueueAccounting,
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn worker_spawn(name: impl Into<String>, source: io::Error) -> Self {
        Self::WorkerSpawn {
            name: name.into(),
            source,
        }
    }

    pub fn thread_panicked(name: impl Into<String>) -> Self {
        Self::ThreadPanicked(name.into())
    }

    /// Maps an I/O error raised while opening or reading `path` to the most
    /// specific variant.
    pub fn from_file_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
