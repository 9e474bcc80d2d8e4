//! Identifier sources: an inclusive numeric range or an input file.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use whscan_core::Identifier;

use crate::error::ScraperError;

/// Largest number of identifiers a single range may expand to.
pub const MAX_RANGE_LEN: u64 = 10_000_000;

/// `start..=end` as identifiers.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidRange`] when `start > end`, and
/// [`ScraperError::RangeTooLarge`] when the range holds more than
/// [`MAX_RANGE_LEN`] identifiers.
pub fn identifier_range(start: u64, end: u64) -> Result<Vec<Identifier>, ScraperError> {
    if start > end {
        return Err(ScraperError::InvalidRange { start, end });
    }
    if (end - start).saturating_add(1) > MAX_RANGE_LEN {
        return Err(ScraperError::RangeTooLarge {
            start,
            end,
            max: MAX_RANGE_LEN,
        });
    }
    Ok((start..=end).map(Identifier::from).collect())
}

/// Reads identifiers from `path`.
///
/// A file whose first non-blank character is `[` is parsed as a JSON array of
/// numbers and/or strings; anything else is one identifier per line, with
/// blank lines and `#` comments skipped. Duplicates are dropped, keeping the
/// first occurrence.
///
/// # Errors
///
/// Returns [`ScraperError::InputFile`] when the file cannot be read or parsed,
/// or holds no identifiers.
pub async fn load_identifiers(path: &Path) -> Result<Vec<Identifier>, ScraperError> {
    let input_error = |reason: String| ScraperError::InputFile {
        path: path.to_path_buf(),
        reason,
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| input_error(e.to_string()))?;

    let raw = if text.trim_start().starts_with('[') {
        parse_json_list(&text).map_err(input_error)?
    } else {
        parse_lines(&text)
    };

    let identifiers = dedupe(raw);
    if identifiers.is_empty() {
        return Err(input_error("no identifiers found".to_owned()));
    }
    tracing::debug!(path = %path.display(), count = identifiers.len(), "loaded identifiers");
    Ok(identifiers)
}

fn parse_json_list(text: &str) -> Result<Vec<Identifier>, String> {
    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Entries(Vec<Identifier>);

    serde_json::from_str::<Entries>(text)
        .map(|entries| entries.0)
        .map_err(|e| format!("invalid JSON identifier list: {e}"))
}

fn parse_lines(text: &str) -> Vec<Identifier> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .filter_map(Identifier::parse)
        .collect()
}

fn dedupe(identifiers: Vec<Identifier>) -> Vec<Identifier> {
    let mut seen = HashSet::with_capacity(identifiers.len());
    identifiers
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
