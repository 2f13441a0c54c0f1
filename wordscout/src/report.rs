//! The boundary between a scan and whoever displays its results.
//!
//! A scan pushes progress ticks and a single completion event into a
//! [`ScanObserver`]; it never touches presentation state directly. The
//! observer is driven from one thread at a time, so implementations need no
//! locking of their own.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::{Result, ScanError};
use crate::results::{ScanOutcome, ScanProgress};

/// Receives the events of one scan run
pub trait ScanObserver {
    /// Called after every processed file, strictly in order 1..=total.
    /// An empty tree produces a single tick with `total == 0` and
    /// `fraction == 1.0`.
    fn on_progress(&mut self, progress: ScanProgress);

    /// Called exactly once, after the last progress tick
    fn on_scan_complete(&mut self, outcome: &ScanOutcome);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_progress(&mut self, _progress: ScanProgress) {}

    fn on_scan_complete(&mut self, _outcome: &ScanOutcome) {}
}

/// Observer that keeps every event, mostly useful in tests and for callers
/// that want to inspect the tick history afterwards
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub ticks: Vec<ScanProgress>,
    pub completions: Vec<ScanOutcome>,
}

impl ScanObserver for RecordingObserver {
    fn on_progress(&mut self, progress: ScanProgress) {
        self.ticks.push(progress);
    }

    fn on_scan_complete(&mut self, outcome: &ScanOutcome) {
        self.completions.push(outcome.clone());
    }
}

impl<F> ScanObserver for F
where
    F: FnMut(ScanProgress),
{
    fn on_progress(&mut self, progress: ScanProgress) {
        self(progress)
    }

    fn on_scan_complete(&mut self, _outcome: &ScanOutcome) {}
}

/// Writes each line followed by a newline, replacing any existing file
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(path).map_err(|e| ScanError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| ScanError::io(path, e))?;
    }
    writer.flush().map_err(|e| ScanError::io(path, e))?;
    Ok(())
}
