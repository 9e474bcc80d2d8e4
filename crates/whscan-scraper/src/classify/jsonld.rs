//! schema.org `Product` extraction from `<script type="application/ld+json">`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// The product fields the markdown classifier cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ProductData {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub discount_count: Option<u32>,
}

/// Returns the first `Product` item found in any JSON-LD block.
///
/// Blocks that fail to parse are skipped.
pub(super) fn extract_product(html: &str) -> Option<ProductData> {
    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text) else {
            continue;
        };

        let top: Vec<&Value> = match &value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        // Expand @graph containers.
        let graphs = top
            .iter()
            .filter_map(|item| item.get("@graph"))
            .filter_map(Value::as_array)
            .flatten();

        if let Some(product) = top.iter().copied().chain(graphs).find(|item| is_product(item)) {
            return Some(product_data(product));
        }
    }
    None
}

fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("Product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product")),
        _ => false,
    }
}

fn product_data(item: &Value) -> ProductData {
    let offers: Vec<&Value> = match item.get("offers") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(offer @ Value::Object(_)) => vec![offer],
        _ => Vec::new(),
    };

    let price = offers.iter().find_map(|offer| {
        offer
            .get("price")
            .and_then(decimal_value)
            .or_else(|| offer.get("lowPrice").and_then(decimal_value))
    });

    let discount_count = discount_count(item)
        .or_else(|| offers.iter().find_map(|offer| discount_count(offer)));

    ProductData {
        name: item
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        sku: item.get("sku").and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        price,
        discount_count,
    }
}

fn discount_count(item: &Value) -> Option<u32> {
    let v = item
        .get("discountCount")
        .or_else(|| item.get("discount_count"))?;
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
        .and_then(|n| u32::try_from(n).ok())
}

/// Prices show up as numbers or as strings like `"$1,299.97"`.
fn decimal_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect();
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}
