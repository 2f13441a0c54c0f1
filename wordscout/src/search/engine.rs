use crossbeam_channel::Sender;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, trace, warn};

use super::cancel::CancellationToken;
use super::counter::OccurrenceCounter;
use super::reader::FileReader;
use super::walker::enumerate;
use crate::config::ScanConfig;
use crate::errors::{Result, ScanError};
use crate::metrics::ScanMetrics;
use crate::report::ScanObserver;
use crate::results::{FileTask, ScanOutcome, ScanProgress, ScanStatus, SearchRequest, SearchResult};

/// Lifecycle of a single scan run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Enumerating,
    Counting,
    Completed,
    Cancelled,
    Failed,
}

impl ScanState {
    fn advance(&mut self, next: ScanState) {
        debug_assert!(
            matches!(
                (*self, next),
                (ScanState::Idle, ScanState::Enumerating)
                    | (ScanState::Idle, ScanState::Failed)
                    | (ScanState::Enumerating, ScanState::Counting)
                    | (ScanState::Enumerating, ScanState::Failed)
                    | (ScanState::Counting, ScanState::Completed)
                    | (ScanState::Counting, ScanState::Cancelled)
            ),
            "illegal scan transition {:?} -> {:?}",
            self,
            next
        );
        debug!("Scan state {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// What a worker sends back for each file it handled
struct FileCompletion {
    path: PathBuf,
    count: Result<usize>,
}

/// Drives enumeration, dispatches read+count work to a bounded pool and
/// delivers progress to an observer from the calling thread.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    metrics: ScanMetrics,
    cancel: CancellationToken,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            metrics: ScanMetrics::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an externally owned token instead of the scanner's own
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that stops further dispatches when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Runs one scan for `request`.
    ///
    /// Returns an error without emitting any event when the term is empty or
    /// the root cannot be walked. Otherwise every processed file produces
    /// one progress tick, in order, followed by exactly one
    /// `on_scan_complete`. Per-file failures are counted in the outcome and
    /// never abort the run.
    pub fn scan<O>(&self, request: &SearchRequest, observer: &mut O) -> Result<ScanOutcome>
    where
        O: ScanObserver + ?Sized,
    {
        let mut state = ScanState::Idle;
        info!(
            "Starting scan for {:?} in {}",
            request.search_term(),
            request.root_path().display()
        );

        let counter = match OccurrenceCounter::new(request.search_term()) {
            Ok(counter) => counter,
            Err(e) => {
                state.advance(ScanState::Failed);
                return Err(e);
            }
        };

        state.advance(ScanState::Enumerating);
        let (paths, walk_errors) = match enumerate(request.root_path(), self.config.follow_links)
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Scan aborted: {}", e);
                state.advance(ScanState::Failed);
                return Err(e);
            }
        };
        let tasks: Vec<FileTask> = paths.into_iter().map(FileTask::new).collect();
        let total = tasks.len();
        debug!(
            "Found {} files to process ({} entries skipped)",
            total, walk_errors
        );

        let pool = self.build_pool()?;
        state.advance(ScanState::Counting);

        let reader = FileReader::with_metrics(
            self.config.encoding_mode,
            self.config.file_timeout,
            self.metrics.clone(),
        );

        let mut results = Vec::new();
        let mut failed_count = 0;
        let mut processed = 0;

        if total == 0 {
            observer.on_progress(ScanProgress::new(0, 0));
        } else {
            let (tx, rx) = crossbeam_channel::bounded(self.config.thread_count.get());
            let cancel = &self.cancel;
            let reader = &reader;
            let counter = &counter;
            let tasks = &tasks;
            let pool = pool.as_ref();

            thread::scope(|s| {
                s.spawn(move || dispatch(tasks, pool, reader, counter, cancel, tx));

                for completion in rx.iter() {
                    processed += 1;
                    match completion.count {
                        Ok(count) => {
                            trace!("{}: {} occurrences", completion.path.display(), count);
                            if let Some(result) = SearchResult::from_count(&completion.path, count)
                            {
                                results.push(result);
                            }
                        }
                        Err(e) => {
                            warn!("Skipping {}: {}", completion.path.display(), e);
                            self.metrics.record_failure();
                            failed_count += 1;
                        }
                    }
                    observer.on_progress(ScanProgress::new(processed, total));
                }
            });
        }

        let status = if processed < total && self.cancel.is_cancelled() {
            state.advance(ScanState::Cancelled);
            ScanStatus::Cancelled
        } else {
            state.advance(ScanState::Completed);
            ScanStatus::Completed
        };

        let outcome = ScanOutcome {
            results,
            failed_count,
            walk_errors,
            processed,
            total,
            status,
        };

        self.metrics.log_stats();
        info!(
            "Scan {:?}: {} occurrences in {} files, {}/{} files processed, {} failed",
            outcome.status,
            outcome.total_occurrences(),
            outcome.results.len(),
            outcome.processed,
            outcome.total,
            outcome.failed_count
        );

        observer.on_scan_complete(&outcome);
        Ok(outcome)
    }

    /// A dedicated pool for parallel runs; `None` selects the sequential strategy
    fn build_pool(&self) -> Result<Option<ThreadPool>> {
        let threads = self.config.thread_count.get();
        if threads == 1 {
            debug!("Using sequential strategy");
            return Ok(None);
        }
        debug!("Using worker pool with {} threads", threads);
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("wordscout-worker-{}", i))
            .build()
            .map(Some)
            .map_err(|e| ScanError::config(format!("failed to build worker pool: {}", e)))
    }
}

/// Feeds every task through read+count, checking for cancellation before
/// each file. Runs off the observer's thread; dropping `tx` at the end
/// closes the completion stream.
fn dispatch(
    tasks: &[FileTask],
    pool: Option<&ThreadPool>,
    reader: &FileReader,
    counter: &OccurrenceCounter,
    cancel: &CancellationToken,
    tx: Sender<FileCompletion>,
) {
    match pool {
        None => {
            for task in tasks {
                if !process_task(task, reader, counter, cancel, &tx) {
                    break;
                }
            }
        }
        Some(pool) => pool.install(|| {
            tasks.par_iter().for_each_with(tx, |tx, task| {
                process_task(task, reader, counter, cancel, tx);
            });
        }),
    }
}

/// Returns `false` once the scan should stop dispatching
fn process_task(
    task: &FileTask,
    reader: &FileReader,
    counter: &OccurrenceCounter,
    cancel: &CancellationToken,
    tx: &Sender<FileCompletion>,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let count = reader
        .read_text(&task.file_path)
        .map(|text| counter.count(&text));
    tx.send(FileCompletion {
        path: task.file_path.clone(),
        count,
    })
    .is_ok()
}

/// Runs a scan with `config` and a fresh cancellation token
pub fn scan<O>(request: &SearchRequest, config: &ScanConfig, observer: &mut O) -> Result<ScanOutcome>
where
    O: ScanObserver + ?Sized,
{
    Scanner::new(config.clone()).scan(request, observer)
}
