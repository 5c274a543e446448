//! Gallery image endpoints.

use crate::{auth::require_admin, error::HttpError, AppState};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use famdex_core::cache::invalidation::{invalidate_after_change, CatalogChange};
use famdex_core::models::GalleryImage;
use famdex_core::query::validate_slug;
use famdex_core::AppError;
use serde::Deserialize;

/// Query parameters for image uploads.
#[derive(Debug, Deserialize)]
pub struct UploadImageParams {
    pub filename: Option<String>,
    pub caption: Option<String>,
}

/// Upload a gallery image for a family.
///
/// The raw request body is handed to the media store, which returns the
/// stable URL appended to the gallery. The first image of a family also
/// becomes its thumbnail.
///
/// # Arguments
/// - `state`: Application state.
/// - `headers`: Request headers (admin auth).
/// - `slug`: Owning family slug.
/// - `params`: Optional filename and caption.
/// - `body`: Raw image bytes.
///
/// # Returns
/// The stored [`GalleryImage`] as JSON.
///
/// # Errors
/// Returns an error when the caller is not an admin, the body is empty, the
/// family is missing, or storage fails.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(params): Query<UploadImageParams>,
    body: Bytes,
) -> Result<Json<GalleryImage>, HttpError> {
    require_admin(&headers, &state.config)?;
    let slug = validate_slug(&slug)?;

    if body.is_empty() {
        return Err(AppError::InvalidQuery("Image body must not be empty".to_string()).into());
    }
    if state.db.families.get(slug)?.is_none() {
        return Err(AppError::NotFound.into());
    }

    let filename = params.filename.as_deref().unwrap_or("image.png");
    let url = state.media.store(slug, filename, &body)?;

    let (_, image) = state
        .db
        .families
        .add_gallery_image(slug, &url, params.caption)?
        .ok_or(AppError::NotFound)?;
    invalidate_after_change(
        &state.cache,
        &CatalogChange::ImageAdded {
            slug: slug.to_string(),
        },
    );
    Ok(Json(image))
}

/// Remove a gallery image from a family.
///
/// # Errors
/// Returns an error when the caller is not an admin, the family or image is
/// missing, or storage fails.
pub async fn delete_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((slug, image_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, HttpError> {
    require_admin(&headers, &state.config)?;
    let slug = validate_slug(&slug)?;

    state
        .db
        .families
        .remove_gallery_image(slug, &image_id)?
        .ok_or(AppError::NotFound)?;
    invalidate_after_change(
        &state.cache,
        &CatalogChange::ImageRemoved {
            slug: slug.to_string(),
        },
    );
    Ok(Json(serde_json::json!({ "success": true })))
}
