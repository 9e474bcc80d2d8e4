//! Page classification strategies.
//!
//! Both strategies are site-specific heuristics. They sit behind
//! [`Classifier`] so they can be tuned or swapped without touching the pool
//! or checkpoint code.

mod enumeration;
mod jsonld;
mod markdown;

use whscan_core::{Classification, PageDetails};

use crate::fetch::FetchedPage;

pub use enumeration::{EnumerationClassifier, DEFAULT_MIN_VALID_BYTES};
pub use markdown::MarkdownClassifier;

/// Classification plus whatever fields the strategy extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub classification: Classification,
    pub details: PageDetails,
}

impl Assessment {
    #[must_use]
    pub fn bare(classification: Classification) -> Self {
        Self {
            classification,
            details: PageDetails::default(),
        }
    }
}

/// Decides what a fetched page means.
///
/// Implementations must be total: malformed or missing content yields a
/// negative classification, never a panic or an error.
pub trait Classifier: Send + Sync {
    fn classify(&self, page: &FetchedPage) -> Assessment;
}
