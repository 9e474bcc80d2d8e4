//! Bounded-concurrency fetch-and-classify driver.
//!
//! Identifiers are processed in batches of `concurrency`: every identifier in
//! a batch is in flight at once, and a fixed delay (plus optional jitter)
//! separates batches as politeness toward the target host. Results flow back
//! to a single writer that owns the [`CheckpointState`], so no locking is
//! needed around the processed set.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::time::Instant;
use whscan_core::{AppConfig, Classification, FetchResult, Identifier};

use crate::checkpoint::{CheckpointState, CheckpointStore};
use crate::classify::Classifier;
use crate::fetch::Fetcher;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub concurrency: usize,
    pub batch_delay: Duration,
    /// Upper bound of a uniform random delay added to `batch_delay`.
    pub batch_jitter: Duration,
    /// Save the checkpoint after this many newly recorded results.
    pub checkpoint_every: usize,
    /// How long in-flight requests may finish after an interrupt.
    pub shutdown_grace: Duration,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            concurrency: 100,
            batch_delay: Duration::from_millis(1_500),
            batch_jitter: Duration::ZERO,
            checkpoint_every: 50,
            shutdown_grace: Duration::from_secs(5),
            max_retries: 0,
            retry_backoff_base_ms: 500,
        }
    }
}

impl PoolOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            batch_jitter: Duration::from_millis(config.batch_jitter_ms),
            checkpoint_every: config.checkpoint_every.max(1),
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        }
    }

    fn pause_between_batches(&self) -> Duration {
        let jitter_ms = u64::try_from(self.batch_jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.batch_delay;
        }
        self.batch_delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// What a [`WorkerPool::run`] call did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: CheckpointState,
    /// `true` when the shutdown signal fired before every identifier was
    /// processed.
    pub interrupted: bool,
    /// Results recorded during this run.
    pub fetched: usize,
    /// Input identifiers skipped because they were already processed (or
    /// repeated in the input).
    pub skipped: usize,
    /// In-flight requests dropped when the shutdown grace period ran out.
    /// They stay unprocessed and are fetched on the next run.
    pub abandoned: usize,
    pub saves: usize,
    pub failed_saves: usize,
}

pub struct WorkerPool<F, C> {
    fetcher: F,
    classifier: C,
    options: PoolOptions,
}

impl<F: Fetcher, C: Classifier> WorkerPool<F, C> {
    #[must_use]
    pub fn new(fetcher: F, classifier: C, options: PoolOptions) -> Self {
        Self {
            fetcher,
            classifier,
            options,
        }
    }

    /// Fetches and classifies one identifier. Never fails: a fetch error
    /// becomes an `Error` record.
    pub async fn process(&self, identifier: &Identifier) -> FetchResult {
        let url = self.fetcher.url_for(identifier);
        let fetched = RetryPolicy::new(
            self.options.max_retries,
            self.options.retry_backoff_base_ms,
        )
        .run(|| self.fetcher.fetch(identifier))
        .await;

        match fetched {
            Ok(page) => {
                let assessment = self.classifier.classify(&page);
                FetchResult {
                    identifier: identifier.clone(),
                    url,
                    http_status: Some(page.status),
                    body_length: page.body_length,
                    classification: assessment.classification,
                    details: assessment.details,
                    error: None,
                    fetched_at: Utc::now(),
                }
            }
            Err(err) => {
                tracing::warn!(%identifier, %url, error = %err, "fetch failed");
                FetchResult::failed(identifier.clone(), url, err.to_string())
            }
        }
    }

    /// Processes every identifier not already in `state`, saving to `store`
    /// every `checkpoint_every` results and once at the end.
    ///
    /// When `shutdown` completes, no further batches start; requests already
    /// in flight get `shutdown_grace` to finish and are abandoned after that.
    /// The checkpoint is flushed before returning either way. A failed save is
    /// logged and retried at the next cadence point; it never ends the run.
    ///
    /// `on_result` sees each result as it is recorded, in completion order.
    pub async fn run<S, R>(
        &self,
        identifiers: &[Identifier],
        mut state: CheckpointState,
        store: &CheckpointStore,
        shutdown: S,
        mut on_result: R,
    ) -> RunOutcome
    where
        S: Future<Output = ()>,
        R: FnMut(&FetchResult),
    {
        let mut queued = HashSet::new();
        let pending: Vec<&Identifier> = identifiers
            .iter()
            .filter(|id| !state.is_processed(id) && queued.insert(*id))
            .collect();
        let skipped = identifiers.len() - pending.len();

        let concurrency = self.options.concurrency.max(1);
        let checkpoint_every = self.options.checkpoint_every.max(1);
        let batches = pending.len().div_ceil(concurrency);

        tracing::info!(
            total = identifiers.len(),
            pending = pending.len(),
            skipped,
            concurrency,
            batches,
            "starting scan"
        );

        tokio::pin!(shutdown);
        let mut interrupted = false;
        let mut fetched = 0usize;
        let mut abandoned = 0usize;
        let mut since_save = 0usize;
        let mut saves = 0usize;
        let mut failed_saves = 0usize;

        for (index, batch) in pending.chunks(concurrency).enumerate() {
            if index > 0 {
                let pause = self.options.pause_between_batches();
                tokio::select! {
                    biased;
                    () = &mut shutdown => interrupted = true,
                    () = tokio::time::sleep(pause) => {}
                }
                if interrupted {
                    tracing::warn!("interrupt received between batches; stopping");
                    break;
                }
            }

            let mut in_flight = stream::iter(batch.iter().copied())
                .map(|id| self.process(id))
                .buffer_unordered(concurrency);
            let mut received = 0usize;
            let mut matched = 0usize;
            let mut errors = 0usize;
            let mut deadline: Option<Instant> = None;

            loop {
                let next = if let Some(deadline) = deadline {
                    match tokio::time::timeout_at(deadline, in_flight.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            abandoned += batch.len() - received;
                            tracing::warn!(
                                abandoned = batch.len() - received,
                                "grace period elapsed; abandoning in-flight requests"
                            );
                            break;
                        }
                    }
                } else {
                    tokio::select! {
                        biased;
                        () = &mut shutdown => {
                            interrupted = true;
                            deadline = Some(Instant::now() + self.options.shutdown_grace);
                            tracing::warn!(
                                in_flight = batch.len() - received,
                                grace_secs = self.options.shutdown_grace.as_secs_f64(),
                                "interrupt received; waiting for in-flight requests"
                            );
                            continue;
                        }
                        next = in_flight.next() => next,
                    }
                };

                let Some(result) = next else {
                    break;
                };
                received += 1;
                match result.classification {
                    Classification::Valid | Classification::Markdown => matched += 1,
                    Classification::Error => errors += 1,
                    Classification::Invalid | Classification::NotMarkdown => {}
                }
                on_result(&result);
                if state.record(result) {
                    fetched += 1;
                    since_save += 1;
                }

                if since_save >= checkpoint_every {
                    since_save = 0;
                    if save_checkpoint(store, &state).await {
                        saves += 1;
                    } else {
                        failed_saves += 1;
                    }
                }
            }

            tracing::info!(
                batch = index + 1,
                batches,
                processed = received,
                matched,
                errors,
                total_processed = state.processed_identifiers.len(),
                "batch complete"
            );

            if interrupted {
                break;
            }
        }

        if save_checkpoint(store, &state).await {
            saves += 1;
        } else {
            failed_saves += 1;
        }

        tracing::info!(
            interrupted,
            fetched,
            skipped,
            abandoned,
            total = state.counters.total,
            matched = state.counters.matched,
            excluded = state.counters.excluded,
            errors = state.counters.errors,
            "scan finished"
        );

        RunOutcome {
            state,
            interrupted,
            fetched,
            skipped,
            abandoned,
            saves,
            failed_saves,
        }
    }
}

async fn save_checkpoint(store: &CheckpointStore, state: &CheckpointState) -> bool {
    match store.save(state).await {
        Ok(()) => {
            tracing::debug!(
                path = %store.path().display(),
                processed = state.processed_identifiers.len(),
                "checkpoint saved"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                path = %store.path().display(),
                error = %e,
                "checkpoint save failed; continuing in memory"
            );
            false
        }
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
