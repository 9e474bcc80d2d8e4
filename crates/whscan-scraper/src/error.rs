use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a response for one identifier.
///
/// These never abort a run: the pool turns them into an `Error` record.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("rate limited by target (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Setup and persistence failures.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL template \"{template}\": {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("cannot read identifiers from {path}: {reason}")]
    InputFile { path: PathBuf, reason: String },

    #[error("invalid identifier range {start}..={end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("identifier range {start}..={end} exceeds {max} identifiers")]
    RangeTooLarge { start: u64, end: u64, max: u64 },

    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
