//! Resumable scan progress persisted as a single JSON file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use whscan_core::{Classification, FetchResult, Identifier};

use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub total: usize,
    /// `Valid` or `Markdown`.
    pub matched: usize,
    /// `Invalid` or `NotMarkdown`.
    pub excluded: usize,
    pub errors: usize,
}

impl Counters {
    fn count(&mut self, classification: Classification) {
        self.total += 1;
        match classification {
            Classification::Valid | Classification::Markdown => self.matched += 1,
            Classification::Invalid | Classification::NotMarkdown => self.excluded += 1,
            Classification::Error => self.errors += 1,
        }
    }
}

/// Everything a rerun needs to skip completed work.
///
/// Each processed identifier has exactly one entry in `results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    #[serde(default)]
    pub processed_identifiers: BTreeSet<Identifier>,
    #[serde(default)]
    pub results: Vec<FetchResult>,
    #[serde(default)]
    pub counters: Counters,
}

impl CheckpointState {
    #[must_use]
    pub fn is_processed(&self, identifier: &Identifier) -> bool {
        self.processed_identifiers.contains(identifier)
    }

    /// Records `result` unless its identifier was already processed.
    ///
    /// Returns `false` (and drops the result) for a duplicate.
    pub fn record(&mut self, result: FetchResult) -> bool {
        if !self.processed_identifiers.insert(result.identifier.clone()) {
            return false;
        }
        self.counters.count(result.classification);
        self.results.push(result);
        true
    }

    pub fn matches(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| r.classification.is_match())
    }

    /// Drops every `Error` result so those identifiers are fetched again.
    ///
    /// Returns how many were dropped.
    pub fn forget_errors(&mut self) -> usize {
        let before = self.results.len();
        let results = std::mem::take(&mut self.results);
        let (errors, kept): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|r| r.classification == Classification::Error);
        for r in &errors {
            self.processed_identifiers.remove(&r.identifier);
        }
        self.results = kept;
        self.recount();
        before - self.results.len()
    }

    /// Restores the invariants on a state read from disk: one result per
    /// identifier, every result's identifier marked processed, and counters
    /// that agree with the results.
    fn normalize(&mut self) {
        let mut seen = BTreeSet::new();
        self.results.retain(|r| seen.insert(r.identifier.clone()));
        self.processed_identifiers.extend(seen);
        self.recount();
    }

    fn recount(&mut self) {
        let mut counters = Counters::default();
        for r in &self.results {
            counters.count(r.classification);
        }
        self.counters = counters;
    }
}

#[derive(Serialize)]
struct CheckpointFile<'a> {
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    state: &'a CheckpointState,
}

/// Owns one checkpoint file. The pool is its only writer.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved state, or the empty state when there is nothing usable.
    ///
    /// A file that cannot be parsed is moved aside to `<path>.corrupt` so the
    /// next save does not silently discard it.
    pub async fn load(&self) -> CheckpointState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no checkpoint; starting fresh");
                return CheckpointState::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "checkpoint unreadable; starting fresh"
                );
                return CheckpointState::default();
            }
        };

        match serde_json::from_slice::<CheckpointState>(&bytes) {
            Ok(mut state) => {
                state.normalize();
                tracing::info!(
                    path = %self.path.display(),
                    processed = state.processed_identifiers.len(),
                    matched = state.counters.matched,
                    "loaded checkpoint"
                );
                state
            }
            Err(e) => {
                let aside = sidecar_path(&self.path, "corrupt");
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "checkpoint corrupt; starting fresh"
                );
                if let Err(rename_err) = tokio::fs::rename(&self.path, &aside).await {
                    tracing::warn!(error = %rename_err, "could not move corrupt checkpoint aside");
                }
                CheckpointState::default()
            }
        }
    }

    /// Writes `state` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Serialize`] or [`ScraperError::Persistence`].
    /// The previous checkpoint file is left intact on failure.
    pub async fn save(&self, state: &CheckpointState) -> Result<(), ScraperError> {
        let file = CheckpointFile {
            updated_at: Utc::now(),
            state,
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|source| ScraperError::Serialize {
            context: "checkpoint".to_owned(),
            source,
        })?;
        write_atomic(&self.path, &json).await
    }
}

/// Writes `contents` to a temp file next to `path`, syncs it, then renames it
/// over `path`. Readers see either the old file or the new one.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ScraperError> {
    use tokio::io::AsyncWriteExt;

    let persistence = |source| ScraperError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persistence)?;
    }

    let tmp = sidecar_path(path, "tmp");
    let mut file = tokio::fs::File::create(&tmp).await.map_err(persistence)?;
    file.write_all(contents).await.map_err(persistence)?;
    file.sync_all().await.map_err(persistence)?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(persistence)
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
