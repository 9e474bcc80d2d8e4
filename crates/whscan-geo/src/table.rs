//! In-memory warehouse lookup table.
//!
//! The whole dataset (a few hundred records) is parsed once and never mutated.
//! Point lookups go through a number index; state/city filters and proximity
//! queries are linear scans, which is the right trade at this size.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::distance::haversine_miles;
use crate::error::GeoError;
use crate::types::{Bounds, Neighbor, Resolved, TableStats, WarehouseRecord, NOT_FOUND_NOTE};

#[derive(Debug, Clone, Default)]
pub struct WarehouseTable {
    /// Sorted by warehouse number.
    records: Vec<WarehouseRecord>,
    by_number: HashMap<u32, usize>,
}

/// On-disk shapes: `{ "<number>": { .. } }` or `[ { "number": .., .. } ]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTable {
    Keyed(BTreeMap<String, RawRecord>),
    List(Vec<RawRecord>),
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    number: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zip: Option<Value>,
    #[serde(default)]
    lat: Option<Value>,
    #[serde(default)]
    lon: Option<Value>,
    #[serde(default)]
    phone: Option<String>,
}

impl WarehouseTable {
    /// Loads and parses the whole table file.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Io`] if the file cannot be read and
    /// [`GeoError::Parse`] if it is not one of the accepted JSON shapes.
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let raw = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&raw).map_err(|source| GeoError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            warehouses = table.len(),
            "loaded warehouse table"
        );
        Ok(table)
    }

    /// Parses a table from JSON text. Incomplete records are skipped.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the text is not an accepted shape.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: RawTable = serde_json::from_str(raw)?;
        let records = match parsed {
            RawTable::Keyed(map) => map
                .into_iter()
                .filter_map(|(key, rec)| {
                    let number = key.trim().parse::<u32>().ok();
                    into_record(number, rec)
                })
                .collect(),
            RawTable::List(list) => list
                .into_iter()
                .filter_map(|rec| into_record(None, rec))
                .collect(),
        };
        Ok(Self::from_records(records))
    }

    /// Builds a table from already-validated records. Duplicate numbers keep
    /// the first occurrence.
    #[must_use]
    pub fn from_records(mut records: Vec<WarehouseRecord>) -> Self {
        records.sort_by_key(|r| r.number);
        records.dedup_by(|later, earlier| {
            let dup = later.number == earlier.number;
            if dup {
                tracing::warn!(number = later.number, "duplicate warehouse number; keeping first");
            }
            dup
        });
        let by_number = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.number, i))
            .collect();
        Self { records, by_number }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, ordered by warehouse number.
    #[must_use]
    pub fn records(&self) -> &[WarehouseRecord] {
        &self.records
    }

    #[must_use]
    pub fn lookup(&self, number: u32) -> Option<&WarehouseRecord> {
        self.by_number.get(&number).map(|&i| &self.records[i])
    }

    /// Looks up each number in order. Unknown numbers come back as
    /// [`Resolved::Missing`] instead of being dropped.
    #[must_use]
    pub fn resolve(&self, numbers: &[u32]) -> Vec<Resolved<'_>> {
        numbers
            .iter()
            .map(|&number| {
                self.lookup(number).map_or(
                    Resolved::Missing {
                        number,
                        note: NOT_FOUND_NOTE,
                    },
                    Resolved::Found,
                )
            })
            .collect()
    }

    /// Free-text search.
    ///
    /// An all-digit query naming a known warehouse returns just that record.
    /// Otherwise the query is matched case-insensitively as a substring of
    /// name, city, or address. A blank query matches nothing.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&WarehouseRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        if query.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(record) = query.parse().ok().and_then(|n| self.lookup(n)) {
                return vec![record];
            }
        }
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                [&r.name, &r.city, &r.address]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Records in `state` (case-insensitive), ordered by number.
    #[must_use]
    pub fn by_state(&self, state: &str) -> Vec<&WarehouseRecord> {
        let wanted = state.trim();
        self.records
            .iter()
            .filter(|r| r.state.eq_ignore_ascii_case(wanted))
            .collect()
    }

    /// Records whose city matches exactly (case-insensitive), optionally
    /// restricted to a state.
    #[must_use]
    pub fn by_city(&self, city: &str, state: Option<&str>) -> Vec<&WarehouseRecord> {
        let wanted = city.trim();
        self.records
            .iter()
            .filter(|r| r.city.trim().eq_ignore_ascii_case(wanted))
            .filter(|r| state.is_none_or(|s| r.state.eq_ignore_ascii_case(s.trim())))
            .collect()
    }

    /// The `k` records closest to `(lat, lon)`, nearest first.
    ///
    /// Returns every record when the table holds fewer than `k`. Ties are
    /// broken by warehouse number so results are deterministic.
    #[must_use]
    pub fn nearest(&self, lat: f64, lon: f64, k: usize) -> Vec<Neighbor<'_>> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored = self.scored(lat, lon);
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_neighbors);
            scored.truncate(k);
        }
        scored.sort_by(compare_neighbors);
        scored
    }

    /// Every record within `radius_miles` of `(lat, lon)`, nearest first.
    #[must_use]
    pub fn within_radius(&self, lat: f64, lon: f64, radius_miles: f64) -> Vec<Neighbor<'_>> {
        let mut scored: Vec<Neighbor<'_>> = self
            .scored(lat, lon)
            .into_iter()
            .filter(|n| n.distance_miles <= radius_miles)
            .collect();
        scored.sort_by(compare_neighbors);
        scored
    }

    /// Bounding box and centroid of the whole table; `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(self.records.iter())
    }

    #[must_use]
    pub fn stats(&self) -> TableStats {
        let mut states: BTreeMap<String, usize> = BTreeMap::new();
        for r in &self.records {
            *states.entry(r.state.clone()).or_insert(0) += 1;
        }
        TableStats {
            total: self.records.len(),
            state_count: states.len(),
            states,
        }
    }

    fn scored(&self, lat: f64, lon: f64) -> Vec<Neighbor<'_>> {
        self.records
            .iter()
            .map(|record| Neighbor {
                record,
                distance_miles: haversine_miles(lat, lon, record.lat, record.lon),
            })
            .collect()
    }
}

fn compare_neighbors(a: &Neighbor<'_>, b: &Neighbor<'_>) -> Ordering {
    a.distance_miles
        .total_cmp(&b.distance_miles)
        .then_with(|| a.record.number.cmp(&b.record.number))
}

/// Bounding box and centroid over any set of records; `None` when empty.
#[must_use]
pub fn bounds_of<'a, I>(records: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a WarehouseRecord>,
{
    let mut iter = records.into_iter();
    let first = iter.next()?;
    let mut b = Bounds {
        min_lat: first.lat,
        max_lat: first.lat,
        min_lon: first.lon,
        max_lon: first.lon,
        center_lat: first.lat,
        center_lon: first.lon,
        count: 1,
    };
    let (mut sum_lat, mut sum_lon) = (first.lat, first.lon);
    for r in iter {
        b.min_lat = b.min_lat.min(r.lat);
        b.max_lat = b.max_lat.max(r.lat);
        b.min_lon = b.min_lon.min(r.lon);
        b.max_lon = b.max_lon.max(r.lon);
        sum_lat += r.lat;
        sum_lon += r.lon;
        b.count += 1;
    }
    // Record counts stay in the hundreds; no precision concern.
    #[allow(clippy::cast_precision_loss)]
    let n = b.count as f64;
    b.center_lat = sum_lat / n;
    b.center_lon = sum_lon / n;
    Some(b)
}

fn into_record(key_number: Option<u32>, raw: RawRecord) -> Option<WarehouseRecord> {
    let number = key_number.or_else(|| raw.number.as_ref().and_then(value_as_u32));
    let (Some(number), Some(name), Some(city), Some(state), Some(lat), Some(lon)) = (
        number,
        raw.name.filter(|s| !s.trim().is_empty()),
        raw.city.filter(|s| !s.trim().is_empty()),
        raw.state.filter(|s| !s.trim().is_empty()),
        raw.lat.as_ref().and_then(value_as_f64),
        raw.lon.as_ref().and_then(value_as_f64),
    ) else {
        tracing::warn!(?number, "skipping incomplete warehouse record");
        return None;
    };

    Some(WarehouseRecord {
        number,
        name: name.trim().to_string(),
        address: raw.address.unwrap_or_default().trim().to_string(),
        city: city.trim().to_string(),
        state: state.trim().to_uppercase(),
        zip: raw.zip.as_ref().map(value_as_string).unwrap_or_default(),
        lat,
        lon,
        phone: raw.phone.filter(|s| !s.trim().is_empty()),
    })
}

// Coordinates and numbers may be strings or numbers depending on the export.
fn value_as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|f| f.is_finite())
}

fn value_as_u32(v: &Value) -> Option<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u32>().ok()))
}

fn value_as_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
