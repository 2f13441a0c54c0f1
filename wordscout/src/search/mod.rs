//! The scan pipeline: enumerate files, read each one, count the term and
//! report progress as files complete.
//!
//! Reads and counts run on a bounded rayon pool (or inline when the pool
//! size is one). Each worker hands its completion to a channel, and the
//! calling thread drains that channel, so results and the processed counter
//! have a single owner and observer callbacks never run concurrently.
pub mod cancel;
pub mod counter;
pub mod engine;
pub mod reader;
pub mod walker;

pub use cancel::CancellationToken;
pub use counter::{count_occurrences, OccurrenceCounter};
pub use engine::{scan, Scanner};
pub use reader::FileReader;
pub use walker::{enumerate, FileWalker};
