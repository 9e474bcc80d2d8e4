use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single warehouse location. Read-only once the table is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseRecord {
    pub number: u32,
    pub name: String,
    pub address: String,
    pub city: String,
    /// Two-letter state or province code, upper-cased at load.
    pub state: String,
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Note attached to a number that is not in the table.
pub const NOT_FOUND_NOTE: &str = "not found in warehouse table";

/// Outcome of resolving one warehouse number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved<'a> {
    Found(&'a WarehouseRecord),
    Missing { number: u32, note: &'static str },
}

/// A record paired with its distance from a query point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Neighbor<'a> {
    #[serde(flatten)]
    pub record: &'a WarehouseRecord,
    pub distance_miles: f64,
}

/// Bounding box and centroid of a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub total: usize,
    pub state_count: usize,
    pub states: BTreeMap<String, usize>,
}
