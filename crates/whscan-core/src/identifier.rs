//! Scan identifiers: warehouse numbers or product ids.
//!
//! Identifiers are stored as trimmed strings so numeric ranges and opaque
//! product ids share one type. Ordering is numeric when both sides are
//! integers, which keeps checkpoint files and result lists in the order a
//! human expects (`2` before `10`).

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Builds an identifier from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` for empty input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value when the identifier is a plain unsigned integer.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }
}

impl From<u32> for Identifier {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Identifiers arrive as JSON strings or bare numbers depending on who wrote
/// the file; both deserialize to the same value.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawIdentifier::deserialize(deserializer)? {
            RawIdentifier::Number(n) => Ok(Self::from(n)),
            RawIdentifier::Text(s) => {
                Self::parse(&s).ok_or_else(|| serde::de::Error::custom("empty identifier"))
            }
        }
    }
}
