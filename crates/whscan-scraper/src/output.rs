//! Final results file plus a plain-text list of matched identifiers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use whscan_core::{FetchResult, Identifier};

use crate::checkpoint::{write_atomic, CheckpointState, Counters};
use crate::error::ScraperError;

#[derive(Debug, Serialize)]
pub struct ResultsDocument<'a> {
    pub completed_at: DateTime<Utc>,
    pub counters: Counters,
    /// Number of entries in `records`.
    pub total: usize,
    pub records: Vec<&'a FetchResult>,
}

impl<'a> ResultsDocument<'a> {
    /// Matched records (or every record when `include_unmatched`), sorted by
    /// identifier.
    #[must_use]
    pub fn from_state(state: &'a CheckpointState, include_unmatched: bool) -> Self {
        let mut records: Vec<&FetchResult> = state
            .results
            .iter()
            .filter(|r| include_unmatched || r.classification.is_match())
            .collect();
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        Self {
            completed_at: Utc::now(),
            counters: state.counters,
            total: records.len(),
            records,
        }
    }
}

/// Where [`write_results`] put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenResults {
    pub results_path: PathBuf,
    pub list_path: PathBuf,
    pub records: usize,
    pub matched: usize,
}

/// Writes `<output>` (JSON) and `<output>.txt` (one matched identifier per
/// line, sorted).
///
/// # Errors
///
/// Returns [`ScraperError::Serialize`] or [`ScraperError::Persistence`].
pub async fn write_results(
    output: &Path,
    state: &CheckpointState,
    include_unmatched: bool,
) -> Result<WrittenResults, ScraperError> {
    let document = ResultsDocument::from_state(state, include_unmatched);
    let json = serde_json::to_vec_pretty(&document).map_err(|source| ScraperError::Serialize {
        context: "results".to_owned(),
        source,
    })?;
    write_atomic(output, &json).await?;

    let mut matched: Vec<&Identifier> = state.matches().map(|r| &r.identifier).collect();
    matched.sort();
    let mut listing = String::new();
    for id in &matched {
        listing.push_str(id.as_str());
        listing.push('\n');
    }
    let list_path = list_path(output);
    write_atomic(&list_path, listing.as_bytes()).await?;

    tracing::info!(
        path = %output.display(),
        records = document.total,
        matched = matched.len(),
        "wrote results"
    );

    Ok(WrittenResults {
        results_path: output.to_path_buf(),
        list_path,
        records: document.total,
        matched: matched.len(),
    })
}

fn list_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}
