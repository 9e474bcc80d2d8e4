use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use super::*;

const TABLE_JSON: &str = r#"{
    "1": {"name": "Los Angeles", "address": "2901 Los Feliz Blvd", "city": "Los Angeles",
          "state": "CA", "zip": "90039", "lat": 34.0, "lon": -118.0},
    "2": {"name": "New York", "address": "976 3rd Ave", "city": "Brooklyn",
          "state": "NY", "zip": "11232", "lat": 40.0, "lon": -74.0},
    "3": {"name": "Burbank", "address": "1051 W Burbank Blvd", "city": "Burbank",
          "state": "CA", "zip": "91506", "lat": 34.1, "lon": -118.2}
}"#;

fn app() -> Router {
    let table = WarehouseTable::from_json(TABLE_JSON).expect("fixture table");
    build_app(AppState {
        table: Arc::new(table),
    })
}

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn numbers(json: &serde_json::Value) -> Vec<u64> {
    json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|w| w["number"].as_u64().expect("number"))
        .collect()
}

#[test]
fn normalize_k_applies_defaults_and_bounds() {
    assert_eq!(normalize_k(None), 5);
    assert_eq!(normalize_k(Some(0)), 1);
    assert_eq!(normalize_k(Some(1_000)), 50);
    assert_eq!(normalize_k(Some(7)), 7);
}

#[test]
fn api_error_codes_map_to_statuses() {
    assert_eq!(
        ApiError::new("req-1", "not_found", "missing")
            .into_response()
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ApiError::new("req-1", "bad_request", "invalid input")
            .into_response()
            .status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::new("req-1", "boom", "unexpected")
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn health_reports_table_size() {
    let (status, json) = get_json("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["warehouses"], 3);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn lists_all_or_filters_by_state_and_city() {
    let (status, json) = get_json("/api/v1/warehouses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![1, 2, 3]);

    let (_, json) = get_json("/api/v1/warehouses?state=ca").await;
    assert_eq!(numbers(&json), vec![1, 3]);

    let (_, json) = get_json("/api/v1/warehouses?city=burbank&state=CA").await;
    assert_eq!(numbers(&json), vec![3]);
}

#[tokio::test]
async fn search_query_matches_number_or_text() {
    let (status, json) = get_json("/api/v1/warehouses?q=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![2]);

    let (_, json) = get_json("/api/v1/warehouses?q=BLVD").await;
    assert_eq!(numbers(&json), vec![1, 3]);

    let (_, json) = get_json("/api/v1/warehouses?q=976").await;
    assert_eq!(numbers(&json), vec![2]);

    let (_, json) = get_json("/api/v1/warehouses?q=blvd&city=burbank").await;
    assert_eq!(numbers(&json), vec![3]);

    let (status, json) = get_json("/api/v1/warehouses?q=blvd&state=NY").await;
    assert_eq!(status, StatusCode::OK);
    assert!(numbers(&json).is_empty());
}

#[tokio::test]
async fn blank_search_query_lists_everything() {
    let (_, json) = get_json("/api/v1/warehouses?q=%20").await;
    assert_eq!(numbers(&json), vec![1, 2, 3]);
}

#[tokio::test]
async fn gets_one_warehouse_or_404() {
    let (status, json) = get_json("/api/v1/warehouses/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["city"], "Brooklyn");

    let (status, json) = get_json("/api/v1/warehouses/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, json) = get_json("/api/v1/warehouses/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn nearest_returns_closest_first_with_distance() {
    let (status, json) = get_json("/api/v1/warehouses/nearest?lat=34.0&lon=-118.1&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![1, 3]);
    let first = json["data"][0]["distance_miles"].as_f64().unwrap();
    let second = json["data"][1]["distance_miles"].as_f64().unwrap();
    assert!(first <= second);
}

#[tokio::test]
async fn nearest_clamps_k_and_validates_coordinates() {
    let (status, json) = get_json("/api/v1/warehouses/nearest?lat=34&lon=-118&k=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json).len(), 1);

    let (status, json) = get_json("/api/v1/warehouses/nearest?lat=91&lon=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");

    let (status, _) = get_json("/api/v1/warehouses/nearest?lat=34").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn within_filters_by_radius() {
    let (status, json) =
        get_json("/api/v1/warehouses/within?lat=34.0&lon=-118.0&miles=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(numbers(&json), vec![1, 3]);

    let (status, _) = get_json("/api/v1/warehouses/within?lat=34&lon=-118&miles=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_include_state_counts_and_bounds() {
    let (status, json) = get_json("/api/v1/warehouses/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["stats"]["total"], 3);
    assert_eq!(json["data"]["stats"]["states"]["CA"], 2);
    assert_eq!(json["data"]["bounds"]["max_lat"], 40.0);
}
