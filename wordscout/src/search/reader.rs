use crossbeam_channel::RecvTimeoutError;
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{trace, warn};

use crate::config::EncodingMode;
use crate::errors::{Result, ScanError};
use crate::metrics::ScanMetrics;

/// Files at or above this size are memory mapped instead of read into a buffer
pub(crate) const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Decodes raw bytes according to the encoding mode
fn decode_bytes(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> Result<String> {
    match encoding_mode {
        EncodingMode::FailFast => match std::str::from_utf8(bytes) {
            Ok(valid) => Ok(valid.to_owned()),
            // Only the error path pays for the copy needed to build a FromUtf8Error
            Err(_) => String::from_utf8(bytes.to_vec()).map_err(|e| ScanError::encoding(path, e)),
        },
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            if let std::borrow::Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow.into_owned())
        }
    }
}

fn read_mapped(path: &Path, encoding_mode: EncodingMode) -> Result<(String, u64)> {
    let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ScanError::io(path, e))?;
    let text = decode_bytes(&mmap, path, encoding_mode)?;
    Ok((text, mmap.len() as u64))
}

fn read_buffered(path: &Path, encoding_mode: EncodingMode) -> Result<(String, u64)> {
    let bytes = fs::read(path).map_err(|e| ScanError::io(path, e))?;
    let text = decode_bytes(&bytes, path, encoding_mode)?;
    Ok((text, bytes.len() as u64))
}

fn read_whole(path: &Path, encoding_mode: EncodingMode, metrics: &ScanMetrics) -> Result<String> {
    trace!("Reading file: {}", path.display());

    let mapped = match fs::metadata(path) {
        Ok(metadata) => metadata.len() >= MMAP_THRESHOLD,
        Err(e) => {
            warn!("Failed to get metadata for {}: {}", path.display(), e);
            false
        }
    };

    let (text, bytes) = if mapped {
        read_mapped(path, encoding_mode)?
    } else {
        read_buffered(path, encoding_mode)?
    };
    metrics.record_read(bytes, mapped);
    Ok(text)
}

/// Reads whole files as text, one file per call
#[derive(Debug, Clone)]
pub struct FileReader {
    encoding_mode: EncodingMode,
    timeout: Option<Duration>,
    metrics: ScanMetrics,
}

impl FileReader {
    pub fn new(encoding_mode: EncodingMode, timeout: Option<Duration>) -> Self {
        Self::with_metrics(encoding_mode, timeout, ScanMetrics::new())
    }

    pub fn with_metrics(
        encoding_mode: EncodingMode,
        timeout: Option<Duration>,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            encoding_mode,
            timeout,
            metrics,
        }
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Reads the full contents of `path` as text.
    ///
    /// Fails with [`ScanError::Io`] when the file cannot be opened or read,
    /// or when the configured timeout expires, and with
    /// [`ScanError::Encoding`] when fail-fast decoding rejects the bytes.
    pub fn read_text(&self, path: &Path) -> Result<String> {
        match self.timeout {
            None => read_whole(path, self.encoding_mode, &self.metrics),
            Some(limit) => self.read_with_timeout(path, limit),
        }
    }

    /// Runs the read on a helper thread and waits at most `limit` for it.
    /// A read that overruns keeps its thread until the OS call returns.
    fn read_with_timeout(&self, path: &Path, limit: Duration) -> Result<String> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let owned: PathBuf = path.to_path_buf();
        let encoding_mode = self.encoding_mode;
        let metrics = self.metrics.clone();

        thread::Builder::new()
            .name("wordscout-read".to_string())
            .spawn(move || {
                let _ = tx.send(read_whole(&owned, encoding_mode, &metrics));
            })
            .map_err(|e| ScanError::io(path, e))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Read of {} exceeded {}",
                    path.display(),
                    humantime::format_duration(limit)
                );
                self.metrics.record_timeout();
                Err(ScanError::timed_out(path))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ScanError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, "reader thread exited"),
            )),
        }
    }
}
