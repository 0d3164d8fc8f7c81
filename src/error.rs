//! Error types for the Yandex Disk client.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for disk client operations.
#[derive(Error, Debug)]
pub enum DiskError {
    /// Missing or unusable credentials/settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required path argument was empty.
    #[error("{0} path must not be empty")]
    MissingPath(&'static str),

    /// The local source does not exist.
    #[error("local path not found: {}", .0.display())]
    LocalNotFound(PathBuf),

    /// The local source is not a directory.
    #[error("local folder not found or not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Yandex Disk has no file versioning.
    #[error("not implemented: Yandex Disk does not support file versioning")]
    VersioningUnsupported,

    /// The API answered with a status the operation cannot recover from.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// A success status came back without the transfer URL.
    #[error("could not obtain {0} URL")]
    MissingHref(&'static str),

    /// Network request error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while walking a local folder.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Coarse classification of a [`DiskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Transport,
    Protocol,
}

impl ErrorKind {
    /// Process exit code used by the CLI for this kind of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Validation => 1,
            ErrorKind::Transport => 2,
            ErrorKind::Protocol => 3,
        }
    }
}

impl DiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiskError::Config(_) => ErrorKind::Config,
            DiskError::MissingPath(_)
            | DiskError::LocalNotFound(_)
            | DiskError::NotADirectory(_)
            | DiskError::VersioningUnsupported => ErrorKind::Validation,
            DiskError::Status { .. }
            | DiskError::Request(_)
            | DiskError::Io(_)
            | DiskError::Walk(_) => ErrorKind::Transport,
            DiskError::MissingHref(_) | DiskError::Json(_) => ErrorKind::Protocol,
        }
    }
}

/// Result type alias for disk client operations.
pub type Result<T> = std::result::Result<T, DiskError>;
