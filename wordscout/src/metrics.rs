use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters collected while files are read. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    files_read: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
    mmap_files: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
    timeouts: Arc<AtomicU64>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            files_read: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            mmap_files: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
            timeouts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a successful read of `bytes` bytes
    pub fn record_read(&self, bytes: u64, mapped: bool) {
        self.files_read.fetch_add(1, Ordering::Relaxed);
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if mapped {
            self.mmap_files.fetch_add(1, Ordering::Relaxed);
        }
        debug!("Read {} bytes, total: {} bytes", bytes, total);
    }

    /// Records a file that could not be read or decoded
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read abandoned after its per-file timeout
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            files_read: self.files_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            mmap_files: self.mmap_files.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Files read: {} ({} memory mapped)\n\
             Bytes read: {}\n\
             Failures: {} ({} timed out)",
            stats.files_read, stats.mmap_files, stats.bytes_read, stats.failures, stats.timeouts
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    pub files_read: u64,
    pub bytes_read: u64,
    pub mmap_files: u64,
    pub failures: u64,
    pub timeouts: u64,
}
