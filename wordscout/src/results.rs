//! Value types that flow through a scan: the request that starts it, the
//! per-file task, the per-file result, progress ticks and the final outcome.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{Result, ScanError};

/// What to search for and where. Validated on construction and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    search_term: String,
    root_path: PathBuf,
}

impl SearchRequest {
    /// Creates a request, rejecting an empty term or a blank root path
    pub fn new(search_term: impl Into<String>, root_path: impl Into<PathBuf>) -> Result<Self> {
        let search_term = search_term.into();
        let root_path = root_path.into();

        if search_term.is_empty() {
            return Err(ScanError::invalid_argument("search term must not be empty"));
        }
        if root_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ScanError::invalid_argument("root path must not be blank"));
        }

        Ok(Self {
            search_term,
            root_path,
        })
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

/// One discovered file waiting to be read and counted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub file_path: PathBuf,
}

impl FileTask {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}

/// A file in which the term occurs at least once
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchResult {
    /// Final path component
    pub file_name: String,
    /// Path as produced by the enumerator
    pub file_path: PathBuf,
    /// Number of non-overlapping occurrences, always positive
    pub count: usize,
}

impl SearchResult {
    /// Builds a result for `path`, or `None` when `count` is zero
    pub fn from_count(path: &Path, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Some(Self {
            file_name,
            file_path: path.to_path_buf(),
            count,
        })
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File: {}, Path: {}, Occurrences: {}",
            self.file_name,
            self.file_path.display(),
            self.count
        )
    }
}

/// Files processed so far out of the total fixed at enumeration time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
    /// `processed / total`, or 1.0 when there is nothing to process
    pub fraction: f64,
}

impl ScanProgress {
    pub fn new(processed: usize, total: usize) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            (processed as f64 / total as f64).clamp(0.0, 1.0)
        };
        Self {
            processed,
            total,
            fraction,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// How a scan run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Cancelled,
}

/// Everything a finished scan hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    /// Matching files in completion order
    pub results: Vec<SearchResult>,
    /// Files that could not be read or decoded
    pub failed_count: usize,
    /// Directory entries the walker could not read, including skipped link cycles
    pub walk_errors: usize,
    pub processed: usize,
    pub total: usize,
    pub status: ScanStatus,
}

impl ScanOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }

    /// Sum of occurrences across all matching files
    pub fn total_occurrences(&self) -> usize {
        self.results.iter().map(|r| r.count).sum()
    }

    /// One display line per result, ready for [`write_lines`](crate::report::write_lines)
    pub fn to_lines(&self) -> Vec<String> {
        self.results.iter().map(ToString::to_string).collect()
    }
}
