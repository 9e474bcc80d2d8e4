use std::io::Write;

use super::*;

fn record(number: u32, state: &str, city: &str, lat: f64, lon: f64) -> WarehouseRecord {
    WarehouseRecord {
        number,
        name: format!("Warehouse {number}"),
        address: format!("{number} Main St"),
        city: city.to_string(),
        state: state.to_string(),
        zip: "00000".to_string(),
        lat,
        lon,
        phone: None,
    }
}

/// A(34.0,-118.1), B(40.7,-74.0), C(34.05,-118.2)
fn three_record_table() -> WarehouseTable {
    WarehouseTable::from_records(vec![
        record(1, "CA", "Alhambra", 34.0, -118.1),
        record(2, "NY", "Brooklyn", 40.7, -74.0),
        record(3, "CA", "Los Angeles", 34.05, -118.2),
    ])
}

#[test]
fn nearest_returns_a_then_c() {
    let table = three_record_table();
    let hits = table.nearest(34.0, -118.1, 2);
    let numbers: Vec<u32> = hits.iter().map(|n| n.record.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

#[test]
fn nearest_exact_point_has_zero_distance() {
    let table = three_record_table();
    let hits = table.nearest(40.7, -74.0, 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.number, 2);
    assert!(hits[0].distance_miles.abs() < 1e-9);
}

#[test]
fn nearest_caps_at_table_size_and_is_sorted() {
    let table = three_record_table();
    let hits = table.nearest(39.0, -100.0, 10);
    assert_eq!(hits.len(), 3);
    assert!(hits
        .windows(2)
        .all(|w| w[0].distance_miles <= w[1].distance_miles));
}

#[test]
fn nearest_with_k_zero_is_empty() {
    assert!(three_record_table().nearest(34.0, -118.1, 0).is_empty());
}

#[test]
fn nearest_on_larger_table_matches_full_sort() {
    let records: Vec<WarehouseRecord> = (0..200u32)
        .map(|i| {
            let f = f64::from(i);
            record(i + 1, "TX", "Grid", 25.0 + (f * 0.37) % 20.0, -120.0 + (f * 1.13) % 45.0)
        })
        .collect();
    let table = WarehouseTable::from_records(records);
    let k = 7;
    let fast: Vec<u32> = table
        .nearest(33.0, -97.0, k)
        .iter()
        .map(|n| n.record.number)
        .collect();
    let mut all = table.nearest(33.0, -97.0, table.len());
    all.truncate(k);
    let slow: Vec<u32> = all.iter().map(|n| n.record.number).collect();
    assert_eq!(fast, slow);
}

#[test]
fn lookup_by_number() {
    let table = three_record_table();
    assert_eq!(table.lookup(3).map(|r| r.city.as_str()), Some("Los Angeles"));
    assert!(table.lookup(999).is_none());
}

#[test]
fn by_state_is_case_insensitive() {
    let table = three_record_table();
    let ca: Vec<u32> = table.by_state("ca").iter().map(|r| r.number).collect();
    assert_eq!(ca, vec![1, 3]);
    assert!(table.by_state("WA").is_empty());
}

#[test]
fn by_city_with_optional_state() {
    let table = three_record_table();
    assert_eq!(table.by_city("los angeles", None).len(), 1);
    assert_eq!(table.by_city("Los Angeles", Some("ny")).len(), 0);
}

#[test]
fn within_radius_filters_and_sorts() {
    let table = three_record_table();
    let hits = table.within_radius(34.0, -118.1, 50.0);
    let numbers: Vec<u32> = hits.iter().map(|n| n.record.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

#[test]
fn bounds_and_stats() {
    let table = three_record_table();
    let b = table.bounds().expect("non-empty");
    assert_eq!(b.count, 3);
    assert!((b.min_lat - 34.0).abs() < 1e-9);
    assert!((b.max_lat - 40.7).abs() < 1e-9);
    assert!((b.min_lon - -118.2).abs() < 1e-9);

    let stats = table.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.state_count, 2);
    assert_eq!(stats.states.get("CA"), Some(&2));
    assert!(WarehouseTable::default().bounds().is_none());
}

#[test]
fn from_json_keyed_form_skips_incomplete_records() {
    let raw = r#"{
        "428": {"name": "Costco Iwilei", "address": "525 Alakawa St", "city": "Honolulu",
                "state": "hi", "zip": 96817, "lat": 21.316, "lon": "-157.870"},
        "401": {"name": "No Coordinates", "city": "Nowhere", "state": "KS"},
        "abc": {"name": "Bad Key", "city": "X", "state": "TX", "lat": 1.0, "lon": 1.0}
    }"#;
    let table = WarehouseTable::from_json(raw).expect("valid json");
    assert_eq!(table.len(), 1);
    let rec = table.lookup(428).expect("428 present");
    assert_eq!(rec.state, "HI");
    assert_eq!(rec.zip, "96817");
    assert!((rec.lon - -157.870).abs() < 1e-9);
}

#[test]
fn from_json_list_form_and_duplicates() {
    let raw = r#"[
        {"number": 5, "name": "First", "city": "A", "state": "WA", "lat": 47.0, "lon": -122.0},
        {"number": "5", "name": "Second", "city": "B", "state": "WA", "lat": 47.1, "lon": -122.1},
        {"number": 6, "name": "Six", "city": "C", "state": "OR", "lat": 45.0, "lon": -122.5}
    ]"#;
    let table = WarehouseTable::from_json(raw).expect("valid json");
    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(5).map(|r| r.name.as_str()), Some("First"));
}

#[test]
fn from_json_rejects_non_table_shapes() {
    assert!(WarehouseTable::from_json("42").is_err());
}

#[test]
fn load_reads_file_and_reports_missing_path() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{"1": {{"name": "One", "city": "Seattle", "state": "WA", "lat": 47.6, "lon": -122.3}}}}"#
    )
    .expect("write");
    let table = WarehouseTable::load(file.path()).expect("load");
    assert_eq!(table.len(), 1);

    let missing = WarehouseTable::load(Path::new("/definitely/not/here.json"));
    assert!(matches!(missing, Err(GeoError::Io { .. })));
}

#[test]
fn neighbor_serializes_flat() {
    let table = three_record_table();
    let hits = table.nearest(34.0, -118.1, 1);
    let json = serde_json::to_value(hits[0]).expect("serialize");
    assert_eq!(json["number"], 1);
    assert_eq!(json["distance_miles"], 0.0);
}

#[test]
fn search_by_number_returns_that_warehouse_only() {
    let table = three_record_table();
    let hits: Vec<u32> = table.search(" 2 ").iter().map(|r| r.number).collect();
    assert_eq!(hits, vec![2]);
}

#[test]
fn search_matches_name_city_or_address_ignoring_case() {
    let table = three_record_table();
    let numbers = |q: &str| -> Vec<u32> { table.search(q).iter().map(|r| r.number).collect() };

    assert_eq!(numbers("brook"), vec![2]);
    assert_eq!(numbers("LOS ANGELES"), vec![3]);
    assert_eq!(numbers("main st"), vec![1, 2, 3]);
    assert_eq!(numbers("warehouse 1"), vec![1]);
    assert!(numbers("reno").is_empty());
    assert!(numbers("   ").is_empty());
}

#[test]
fn search_for_unknown_number_falls_back_to_text_match() {
    let mut harbor = record(5, "CA", "Fullerton", 33.87, -117.92);
    harbor.address = "1200 Harbor Blvd".to_string();
    let table =
        WarehouseTable::from_records(vec![record(1, "CA", "Alhambra", 34.0, -118.1), harbor]);

    let hits: Vec<u32> = table.search("1200").iter().map(|r| r.number).collect();
    assert_eq!(hits, vec![5]);
    assert!(table.search("99").is_empty());
}

#[test]
fn resolve_keeps_order_and_marks_missing_numbers() {
    let table = three_record_table();
    let resolved = table.resolve(&[3, 42, 1]);
    assert_eq!(resolved.len(), 3);
    assert!(matches!(resolved[0], Resolved::Found(r) if r.number == 3));
    assert_eq!(
        resolved[1],
        Resolved::Missing {
            number: 42,
            note: NOT_FOUND_NOTE
        }
    );
    assert!(matches!(resolved[2], Resolved::Found(r) if r.number == 1));

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json[0]["city"], "Los Angeles");
    assert_eq!(json[1]["number"], 42);
    assert_eq!(json[1]["note"], NOT_FOUND_NOTE);
}
