use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use whscan_geo::{Bounds, TableStats, WarehouseRecord};

use crate::middleware::RequestId;

use super::{normalize_k, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    /// Free-text search over number, name, city, and address.
    pub q: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NearestQuery {
    pub lat: f64,
    pub lon: f64,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WithinQuery {
    pub lat: f64,
    pub lon: f64,
    pub miles: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct TableSummary {
    pub stats: TableStats,
    pub bounds: Option<Bounds>,
}

/// Serializes borrowed table data into the success envelope.
fn respond<T: Serialize>(req_id: RequestId, data: T) -> Response {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn bad_request(req_id: &RequestId, message: impl Into<String>) -> ApiError {
    ApiError::new(req_id.0.clone(), "bad_request", message)
}

fn validate_point(req_id: &RequestId, lat: f64, lon: f64) -> Result<(), ApiError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(bad_request(req_id, "lat must be between -90 and 90"));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(bad_request(req_id, "lon must be between -180 and 180"));
    }
    Ok(())
}

pub(super) async fn list_warehouses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| bad_request(&req_id, e.body_text()))?;
    let search = non_blank(query.q.as_deref());
    let city = non_blank(query.city.as_deref());
    let state_code = non_blank(query.state.as_deref());

    let table = &state.table;
    let data: Vec<&WarehouseRecord> = match (search, city, state_code) {
        (Some(q), city, state_code) => table
            .search(q)
            .into_iter()
            .filter(|r| city.is_none_or(|c| r.city.eq_ignore_ascii_case(c)))
            .filter(|r| state_code.is_none_or(|s| r.state.eq_ignore_ascii_case(s)))
            .collect(),
        (None, Some(city), state_code) => table.by_city(city, state_code),
        (None, None, Some(state_code)) => table.by_state(state_code),
        (None, None, None) => table.records().iter().collect(),
    };

    Ok(respond(req_id, data))
}

pub(super) async fn get_warehouse(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    number: Result<Path<u32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(number) =
        number.map_err(|_| bad_request(&req_id, "warehouse number must be a positive integer"))?;

    let record = state.table.lookup(number).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("warehouse {number} not found"),
        )
    })?;

    Ok(respond(req_id, record))
}

pub(super) async fn nearest_warehouses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<NearestQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| bad_request(&req_id, e.body_text()))?;
    validate_point(&req_id, query.lat, query.lon)?;

    let neighbors = state
        .table
        .nearest(query.lat, query.lon, normalize_k(query.k));
    Ok(respond(req_id, neighbors))
}

pub(super) async fn warehouses_within(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<WithinQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| bad_request(&req_id, e.body_text()))?;
    validate_point(&req_id, query.lat, query.lon)?;
    if !query.miles.is_finite() || query.miles < 0.0 {
        return Err(bad_request(&req_id, "miles must be a non-negative number"));
    }

    let neighbors = state
        .table
        .within_radius(query.lat, query.lon, query.miles);
    Ok(respond(req_id, neighbors))
}

pub(super) async fn table_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<TableSummary>> {
    Json(ApiResponse {
        data: TableSummary {
            stats: state.table.stats(),
            bounds: state.table.bounds(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
