//! Per-identifier scan records and their classifications.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Identifier;

/// Outcome of classifying one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Enumeration: the identifier exists on the target site.
    Valid,
    /// Enumeration: the site served its "not found" template.
    Invalid,
    /// Markdown detection: the product carries a markdown price code or discount.
    Markdown,
    /// Markdown detection: regular price, or no usable structured data.
    NotMarkdown,
    /// The fetch itself failed (timeout, connection, rate limit).
    Error,
}

impl Classification {
    /// `true` for the classifications a scan is looking for.
    #[must_use]
    pub fn is_match(self) -> bool {
        matches!(self, Classification::Valid | Classification::Markdown)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::Valid => "valid",
            Classification::Invalid => "invalid",
            Classification::Markdown => "markdown",
            Classification::NotMarkdown => "not_markdown",
            Classification::Error => "error",
        };
        f.write_str(s)
    }
}

/// Retail price-ending convention.
///
/// The cents component of a shelf price encodes its status: `.99` is the
/// regular price, `.97` a corporate clearance, `.00` and `.88` manager
/// markdowns. Anything else is carried through as raw cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCode {
    FullPrice,
    CorporateClearance,
    ManagerSpecial,
    ManagerMarkdown,
    Other(u8),
}

impl PriceCode {
    /// Derives the price code from the cents of `price` (rounded to 2 dp).
    #[must_use]
    pub fn from_price(price: Decimal) -> Self {
        let cents = (price.round_dp(2).fract() * Decimal::ONE_HUNDRED)
            .abs()
            .to_u8()
            .unwrap_or(0);
        match cents {
            99 => PriceCode::FullPrice,
            97 => PriceCode::CorporateClearance,
            0 => PriceCode::ManagerSpecial,
            88 => PriceCode::ManagerMarkdown,
            other => PriceCode::Other(other),
        }
    }

    /// `true` for the price endings that mark a markdown (`.97`, `.00`, `.88`).
    #[must_use]
    pub fn is_markdown(self) -> bool {
        matches!(
            self,
            PriceCode::CorporateClearance | PriceCode::ManagerSpecial | PriceCode::ManagerMarkdown
        )
    }

    /// The price ending as shown on a shelf tag, e.g. `".97"`.
    #[must_use]
    pub fn suffix(self) -> String {
        match self {
            PriceCode::FullPrice => ".99".to_string(),
            PriceCode::CorporateClearance => ".97".to_string(),
            PriceCode::ManagerSpecial => ".00".to_string(),
            PriceCode::ManagerMarkdown => ".88".to_string(),
            PriceCode::Other(c) => format!(".{c:02}"),
        }
    }
}

/// Fields a classifier managed to pull out of a page body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDetails {
    /// `<title>` text of an enumeration page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_code: Option<PriceCode>,
    /// Number of locations reporting a discount, when the page exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_count: Option<u32>,
}

/// One fetch-and-classify attempt for one identifier. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub identifier: Identifier,
    pub url: String,
    /// `None` when no response was received.
    pub http_status: Option<u16>,
    pub body_length: usize,
    pub classification: Classification,
    #[serde(flatten)]
    pub details: PageDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Builds an `Error` record for a fetch that produced no usable response.
    #[must_use]
    pub fn failed(identifier: Identifier, url: String, error: String) -> Self {
        Self {
            identifier,
            url,
            http_status: None,
            body_length: 0,
            classification: Classification::Error,
            details: PageDetails::default(),
            error: Some(error),
            fetched_at: Utc::now(),
        }
    }
}
