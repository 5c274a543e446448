//! HTTP error mapping for API handlers.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use famdex_core::AppError;
use serde_json::json;

/// Response-side wrapper that maps [`AppError`] onto HTTP semantics.
///
/// Every failure becomes a `{ "success": false, "error": ..., "hint"? }`
/// body; storage and internal errors are logged with full detail and
/// surfaced as a generic message.
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_message, hint) = match &self.0 {
            AppError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string(), None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::RateLimited {
                limit,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit of {} requests per minute exceeded", limit),
                Some(format!("Retry after {} seconds", retry_after_secs)),
            ),
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Storage(_)
            | AppError::Internal => {
                tracing::error!("Internal error: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({ "success": false, "error": error_message });
        if let Some(hint) = &hint {
            body["hint"] = json!(hint);
        }
        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited {
            retry_after_secs, ..
        } = self.0
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
