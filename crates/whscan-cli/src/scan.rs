//! `enumerate` and `markdown` command handlers.
//!
//! Both commands share one pipeline: resolve identifiers, build the fetcher,
//! load the checkpoint, run the pool until done or interrupted, then write
//! the results file. Everything that can fail on bad input fails before the
//! first request goes out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use whscan_core::{AppConfig, FetchResult, Identifier};
use whscan_scraper::{
    identifier_range, load_identifiers, write_results, CheckpointState, CheckpointStore,
    Classifier, EnumerationClassifier, FetcherOptions, HttpFetcher, MarkdownClassifier,
    PoolOptions, RunOutcome, UrlTemplate, WorkerPool,
};

use crate::shutdown_signal;

/// Where the identifiers for an enumeration come from.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = true)]
pub struct IdentifierSource {
    /// First warehouse number to probe
    #[arg(long, requires = "end", conflicts_with = "input_file")]
    pub start: Option<u64>,

    /// Last warehouse number to probe (inclusive)
    #[arg(long, requires = "start", conflicts_with = "input_file")]
    pub end: Option<u64>,

    /// File of identifiers (JSON array or one per line)
    #[arg(long)]
    pub input_file: Option<PathBuf>,
}

/// Pool, checkpoint, and output flags shared by the scan commands.
/// Unset flags fall back to the environment configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Number of requests in flight per batch
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip identifiers recorded in an existing checkpoint (default)
    #[arg(long, overrides_with = "no_resume")]
    pub resume: bool,

    /// Ignore any existing checkpoint and start over
    #[arg(long, overrides_with = "resume")]
    pub no_resume: bool,

    /// Results file (a `.txt` list of matched identifiers is written beside it)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Checkpoint file
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Pause between batches, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// URL template with an `{id}` placeholder
    #[arg(long)]
    pub url_template: Option<String>,

    /// Fetch identifiers again whose previous attempt ended in an error
    #[arg(long)]
    pub retry_errors: bool,

    /// Write every record to the results file, not only matches
    #[arg(long)]
    pub include_unmatched: bool,
}

impl ScanArgs {
    pub fn resume(&self) -> bool {
        !self.no_resume
    }

    /// `base` with any pool flags given on the command line applied.
    pub fn pool_options(&self, base: PoolOptions) -> PoolOptions {
        PoolOptions {
            concurrency: self.concurrency.unwrap_or(base.concurrency).max(1),
            batch_delay: self
                .delay_ms
                .map_or(base.batch_delay, Duration::from_millis),
            ..base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Interrupted,
}

/// Runs warehouse-number enumeration.
///
/// # Errors
///
/// Returns an error for an invalid range, an unreadable input file, a bad URL
/// template, or an HTTP client that cannot be built. Per-identifier failures
/// are recorded, not propagated.
pub(crate) async fn run_enumerate(
    config: &AppConfig,
    source: &IdentifierSource,
    args: &ScanArgs,
    min_valid_bytes: Option<usize>,
) -> anyhow::Result<ScanStatus> {
    let identifiers = match (source.start, source.end, &source.input_file) {
        (_, _, Some(path)) => load_identifiers(path).await?,
        (Some(start), Some(end), None) => identifier_range(start, end)?,
        _ => anyhow::bail!("provide --start and --end, or --input-file"),
    };

    let classifier =
        EnumerationClassifier::new(min_valid_bytes.unwrap_or(config.valid_body_min_bytes));
    run_scan(
        config,
        "enumerate",
        &config.enumerate_url_template,
        identifiers,
        classifier,
        args,
    )
    .await
}

/// Runs product markdown detection over the ids in `input_file`.
///
/// # Errors
///
/// Same setup failures as [`run_enumerate`].
pub(crate) async fn run_markdown(
    config: &AppConfig,
    input_file: &Path,
    args: &ScanArgs,
) -> anyhow::Result<ScanStatus> {
    let identifiers = load_identifiers(input_file).await?;
    run_scan(
        config,
        "markdown",
        &config.markdown_url_template,
        identifiers,
        MarkdownClassifier::new(),
        args,
    )
    .await
}

async fn run_scan<C: Classifier>(
    config: &AppConfig,
    kind: &str,
    default_template: &str,
    identifiers: Vec<Identifier>,
    classifier: C,
    args: &ScanArgs,
) -> anyhow::Result<ScanStatus> {
    let template = UrlTemplate::parse(args.url_template.as_deref().unwrap_or(default_template))?;
    let mut fetcher_options = FetcherOptions::from_config(config, template);
    if let Some(timeout_secs) = args.timeout_secs {
        fetcher_options.timeout_secs = timeout_secs;
    }
    let fetcher = HttpFetcher::new(fetcher_options).context("failed to build HTTP client")?;

    let checkpoint_path = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| config.default_checkpoint_path(kind));
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.default_output_path(kind));
    let store = CheckpointStore::new(checkpoint_path);

    let mut state = if args.resume() {
        store.load().await
    } else {
        CheckpointState::default()
    };
    if args.retry_errors {
        let dropped = state.forget_errors();
        if dropped > 0 {
            tracing::info!(dropped, "re-queued identifiers that previously failed");
        }
    }

    let options = args.pool_options(PoolOptions::from_config(config));
    let pool = WorkerPool::new(fetcher, classifier, options);

    let outcome = pool
        .run(&identifiers, state, &store, shutdown_signal(), print_match)
        .await;

    let written = write_results(&output_path, &outcome.state, args.include_unmatched)
        .await
        .with_context(|| format!("failed to write results to {}", output_path.display()))?;

    print_summary(kind, &outcome);
    println!(
        "results: {} ({} records), list: {}",
        written.results_path.display(),
        written.records,
        written.list_path.display()
    );
    if outcome.failed_saves > 0 {
        println!(
            "warning: {} checkpoint save(s) failed; see log for details",
            outcome.failed_saves
        );
    }

    if outcome.interrupted {
        println!(
            "interrupted: checkpoint saved to {}; rerun the same command to resume",
            store.path().display()
        );
        Ok(ScanStatus::Interrupted)
    } else {
        Ok(ScanStatus::Completed)
    }
}

fn print_match(result: &FetchResult) {
    if !result.classification.is_match() {
        return;
    }
    let details = &result.details;
    match (&details.title, &details.name, details.price, details.price_code) {
        (Some(title), _, _, _) => println!("{} {title}", result.identifier),
        (None, Some(name), Some(price), Some(code)) => println!(
            "{} {name} ${price} ({})",
            result.identifier,
            code.suffix()
        ),
        _ => println!("{} {}", result.identifier, result.classification),
    }
}

fn print_summary(kind: &str, outcome: &RunOutcome) {
    let c = &outcome.state.counters;
    println!(
        "{kind}: {} processed ({} this run, {} skipped) | matched {} | excluded {} | errors {}",
        c.total, outcome.fetched, outcome.skipped, c.matched, c.excluded, c.errors
    );
    if outcome.abandoned > 0 {
        println!(
            "{} in-flight request(s) abandoned; they will be retried on the next run",
            outcome.abandoned
        );
    }
}
