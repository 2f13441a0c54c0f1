pub mod config;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod results;
pub mod search;

pub use config::{EncodingMode, ScanConfig, ScanOverrides};
pub use errors::{Result, ScanError};
pub use report::{write_lines, ScanObserver};
pub use results::{FileTask, ScanOutcome, ScanProgress, ScanStatus, SearchRequest, SearchResult};
pub use search::{count_occurrences, scan, CancellationToken, Scanner};
