//! Scan engine: fetch pages for a list of identifiers, classify them, and
//! keep resumable progress on disk.

pub mod checkpoint;
pub mod classify;
pub mod error;
pub mod fetch;
pub mod input;
pub mod output;
pub mod pool;
mod retry;
pub mod template;

pub use checkpoint::{CheckpointState, CheckpointStore, Counters};
pub use classify::{
    Assessment, Classifier, EnumerationClassifier, MarkdownClassifier, DEFAULT_MIN_VALID_BYTES,
};
pub use error::{FetchError, ScraperError};
pub use fetch::{FetchedPage, Fetcher, FetcherOptions, HttpFetcher};
pub use input::{identifier_range, load_identifiers};
pub use output::{write_results, ResultsDocument, WrittenResults};
pub use pool::{PoolOptions, RunOutcome, WorkerPool};
pub use template::UrlTemplate;
