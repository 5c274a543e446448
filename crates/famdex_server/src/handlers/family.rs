//! Family CRUD, listing, and download endpoints.

use crate::{auth::require_admin, client_ip, error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use famdex_core::cache::invalidation::{category_tag, invalidate_after_change, CatalogChange};
use famdex_core::constants::TAG_FAMILIES;
use famdex_core::models::{
    Category, CreateFamilyRequest, Family, FamilySummary, UpdateFamilyRequest,
};
use famdex_core::query::{catalog_cache_key, category_cache_key, parse_category, validate_slug};
use famdex_core::ratelimit::RouteClass;
use famdex_core::AppError;
use std::time::Duration;

fn cache_ttl(state: &AppState) -> Duration {
    Duration::from_secs(state.config.cache_ttl_secs)
}

fn cached_listing(
    state: &AppState,
    key: String,
    tags: Vec<String>,
    category: Option<Category>,
) -> Result<Vec<FamilySummary>, AppError> {
    let db = state.db.clone();
    state
        .cache
        .get_or_compute(&key, &tags, cache_ttl(state), move || {
            db.families.list_summaries(category)
        })
}

/// List summaries for the whole catalog, served from the listing cache.
///
/// # Errors
/// Returns an error if the underlying listing read fails on a cache miss.
pub async fn list_families(
    State(state): State<AppState>,
) -> Result<Json<Vec<FamilySummary>>, HttpError> {
    let summaries = cached_listing(
        &state,
        catalog_cache_key(),
        vec![TAG_FAMILIES.to_string()],
        None,
    )?;
    Ok(Json(summaries))
}

/// List summaries for one category, served from the listing cache.
///
/// # Errors
/// Returns a validation error for unknown categories, or a storage error on
/// a cache miss.
pub async fn list_families_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<FamilySummary>>, HttpError> {
    let category = parse_category(&category)?;
    let summaries = cached_listing(
        &state,
        category_cache_key(category),
        vec![TAG_FAMILIES.to_string(), category_tag(category)],
        Some(category),
    )?;
    Ok(Json(summaries))
}

/// Fetch one family by slug, bumping its view counter.
///
/// The counter bump is best-effort: a failed increment falls back to a
/// plain read rather than failing the request.
///
/// # Errors
/// Returns an error when the slug is malformed, the family is missing, or
/// the read itself fails.
pub async fn get_family(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Family>, HttpError> {
    let slug = validate_slug(&slug)?;
    let family = match state.db.families.record_view(slug) {
        Ok(row) => row,
        Err(err) => {
            tracing::warn!("View counter bump failed for '{}': {}", slug, err);
            state.db.families.get(slug)?
        }
    };
    family.map(Json).ok_or_else(|| AppError::NotFound.into())
}

/// Resolve a family's download URL, counting the download.
///
/// Downloads sit behind their own admission window, separate from search.
///
/// # Errors
/// Returns an error when admission is denied, the slug is malformed, or the
/// family is missing.
pub async fn download_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    let client = client_ip::client_id(&headers);
    let admission = state.limiter.admit(&client, RouteClass::Download);
    if !admission.allowed {
        return Err(AppError::RateLimited {
            limit: admission.limit,
            retry_after_secs: admission.retry_after_secs,
        }
        .into());
    }

    let slug = validate_slug(&slug)?;
    let family = state
        .db
        .families
        .record_download(slug)?
        .ok_or(AppError::NotFound)?;

    let mut response = Json(serde_json::json!({
        "success": true,
        "download_url": family.download_url,
        "download_count": family.download_count,
    }))
    .into_response();
    if let Ok(value) = HeaderValue::from_str(&admission.remaining.to_string()) {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    Ok(response)
}

/// Create a new family.
///
/// # Errors
/// Returns an error when the caller is not an admin, the slug is invalid or
/// taken, or persistence fails.
pub async fn create_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFamilyRequest>,
) -> Result<Json<Family>, HttpError> {
    require_admin(&headers, &state.config)?;
    let slug = validate_slug(&req.slug)?;

    let mut family = Family::new(
        slug.to_string(),
        req.name,
        req.category,
        req.description,
    );
    if let Some(tags) = req.tags {
        family.tags = tags;
    }
    family.download_url = req.download_url;
    family.file_size_bytes = req.file_size_bytes;
    if let Some(versions) = req.versions {
        family.versions = versions;
    }

    state.db.families.create(&family)?;
    invalidate_after_change(
        &state.cache,
        &CatalogChange::FamilyCreated {
            category: family.category,
        },
    );
    Ok(Json(family))
}

/// Apply a partial update to a family.
///
/// # Errors
/// Returns an error when the caller is not an admin, the slug is malformed,
/// the family is missing, or persistence fails.
pub async fn update_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(req): Json<UpdateFamilyRequest>,
) -> Result<Json<Family>, HttpError> {
    require_admin(&headers, &state.config)?;
    let slug = validate_slug(&slug)?;

    let (updated, old_category) = state
        .db
        .families
        .update(slug, &req)?
        .ok_or(AppError::NotFound)?;
    invalidate_after_change(
        &state.cache,
        &CatalogChange::FamilyUpdated {
            slug: slug.to_string(),
            old_category,
            new_category: updated.category,
        },
    );
    Ok(Json(updated))
}

/// Delete a family by slug.
///
/// # Errors
/// Returns an error when the caller is not an admin, the slug is malformed,
/// the family is missing, or persistence fails.
pub async fn delete_family(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    require_admin(&headers, &state.config)?;
    let slug = validate_slug(&slug)?;

    let deleted = state
        .db
        .families
        .delete(slug)?
        .ok_or(AppError::NotFound)?;
    invalidate_after_change(
        &state.cache,
        &CatalogChange::FamilyDeleted {
            slug: deleted.slug,
            category: deleted.category,
        },
    );
    Ok(Json(serde_json::json!({ "success": true })))
}
