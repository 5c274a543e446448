//! Admin session check for mutation endpoints.
//!
//! The catalog consumes authentication as an opaque "is there an authorized
//! admin session" answer. Here that answer is a bearer-token comparison
//! against the configured token; swapping in a real session backend only
//! touches this module.

use axum::http::{header, HeaderMap};
use famdex_core::{AppError, Config};

/// Require an authorized admin caller.
///
/// # Arguments
/// - `headers`: Request headers carrying `Authorization: Bearer <token>`.
/// - `config`: Configuration holding the expected token; a missing token
///   disables the admin surface entirely.
///
/// # Errors
/// Returns [`AppError::Unauthorized`] when the token is absent, malformed,
/// or wrong.
pub fn require_admin(headers: &HeaderMap, config: &Config) -> Result<(), AppError> {
    let Some(expected) = config.admin_token.as_deref() else {
        return Err(AppError::Unauthorized);
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::require_admin;
    use axum::http::{header, HeaderMap, HeaderValue};
    use famdex_core::Config;

    fn config_with_token(token: Option<&str>) -> Config {
        Config {
            db_path: String::from("/tmp/famdex-db"),
            port: 0,
            max_upload_size: 1024,
            admin_token: token.map(str::to_string),
            cache_ttl_secs: 3600,
            media_dir: String::from("/tmp/famdex-media"),
            media_base_url: String::from("/media"),
        }
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn matching_bearer_token_is_authorized() {
        let config = config_with_token(Some("s3cret"));
        require_admin(&headers_with_auth("Bearer s3cret"), &config).expect("authorized");
    }

    #[test]
    fn wrong_missing_or_malformed_tokens_are_rejected() {
        let config = config_with_token(Some("s3cret"));
        for value in ["Bearer nope", "s3cret", "Basic s3cret", "Bearer"] {
            assert!(
                require_admin(&headers_with_auth(value), &config).is_err(),
                "value: {:?}",
                value
            );
        }
        assert!(require_admin(&HeaderMap::new(), &config).is_err());
    }

    #[test]
    fn unconfigured_token_disables_the_admin_surface() {
        let config = config_with_token(None);
        let err = require_admin(&headers_with_auth("Bearer anything"), &config)
            .expect_err("admin surface must be disabled");
        assert!(matches!(err, famdex_core::AppError::Unauthorized));
    }
}
