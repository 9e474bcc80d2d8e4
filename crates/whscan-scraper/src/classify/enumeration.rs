//! Existence check by response size.
//!
//! The enumeration target answers every identifier with HTTP 200. Real
//! warehouse pages run ~42–44 KB while unknown numbers get a fixed ~9.7 KB
//! template, so body length alone separates them. Nothing in the body is
//! parsed to confirm this; if the site changes its template the threshold
//! has to be re-measured.

use std::sync::LazyLock;

use regex::Regex;
use whscan_core::{Classification, PageDetails};

use super::{Assessment, Classifier};
use crate::fetch::FetchedPage;

/// Smallest body, in bytes, that counts as a real warehouse page
/// (equivalent to "more than 20 000 bytes").
pub const DEFAULT_MIN_VALID_BYTES: usize = 20_001;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationClassifier {
    min_valid_bytes: usize,
}

impl EnumerationClassifier {
    #[must_use]
    pub fn new(min_valid_bytes: usize) -> Self {
        Self { min_valid_bytes }
    }
}

impl Default for EnumerationClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VALID_BYTES)
    }
}

impl Classifier for EnumerationClassifier {
    fn classify(&self, page: &FetchedPage) -> Assessment {
        if page.status != 200 || page.body_length < self.min_valid_bytes {
            return Assessment::bare(Classification::Invalid);
        }

        Assessment {
            classification: Classification::Valid,
            details: PageDetails {
                title: extract_title(&page.body),
                ..PageDetails::default()
            },
        }
    }
}

fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
