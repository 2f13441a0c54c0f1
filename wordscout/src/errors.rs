//! Error types for wordscout.
//!
//! Errors fall into two groups. Scan-fatal errors (an invalid argument, a
//! root that is missing or not a directory, a failed output write) abort the
//! operation and are returned to the caller. Per-file errors (unreadable or
//! undecodable content, a read that timed out) are recovered by the scan
//! engine: the file is skipped and tallied in the outcome.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for wordscout operations
pub type Result<T, E = ScanError> = std::result::Result<T, E>;

/// Errors that can occur while counting, enumerating, scanning or reporting
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn timed_out(path: impl Into<PathBuf>) -> Self {
        Self::io(
            path,
            io::Error::new(io::ErrorKind::TimedOut, "file read timed out"),
        )
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn encoding(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The file this error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Encoding { path, .. } | Self::NotADirectory(path) => {
                Some(path)
            }
            Self::InvalidArgument(_) | Self::Config(_) => None,
        }
    }

    /// Whether this is an I/O failure that ran into the per-file timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::TimedOut)
    }
}

impl From<config::ConfigError> for ScanError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
