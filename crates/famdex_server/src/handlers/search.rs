//! Catalog search endpoint.

use crate::{client_ip, error::HttpError, AppState};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use famdex_core::models::Family;
use famdex_core::search::{Pagination, RawSearchParams};
use serde::Serialize;

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    data: Vec<Family>,
    pagination: Pagination,
    query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

fn insert_numeric_header(response: &mut Response, name: &'static str, value: usize) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        response.headers_mut().insert(name, value);
    }
}

/// Search families by text with optional tag filtering and pagination.
///
/// Quota is consumed before validation; the remaining-quota, total-count,
/// and current-page headers are informational.
///
/// # Arguments
/// - `state`: Application state.
/// - `headers`: Request headers (client identity).
/// - `raw`: Raw search parameters.
///
/// # Returns
/// The search payload with pagination metadata.
///
/// # Errors
/// Returns an error when admission is denied, the query is invalid, or the
/// repository fails.
pub async fn search_families(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(raw): Query<RawSearchParams>,
) -> Result<Response, HttpError> {
    let client = client_ip::client_id(&headers);
    let outcome = state.search.search(&raw, &client)?;

    let remaining = outcome.remaining as usize;
    let pagination = outcome.pagination;
    let body = SearchResponse {
        success: true,
        data: outcome.data,
        pagination,
        query: outcome.query,
        tags: outcome.tags,
    };

    let mut response = Json(body).into_response();
    insert_numeric_header(&mut response, "x-ratelimit-remaining", remaining);
    insert_numeric_header(&mut response, "x-total-count", pagination.total);
    insert_numeric_header(&mut response, "x-page", pagination.page);
    Ok(response)
}
