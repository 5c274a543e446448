//! Client identity derivation for admission control.

use axum::http::HeaderMap;

/// Bucket shared by every request whose origin cannot be identified.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit client identity from forwarded headers.
///
/// Takes the first value of a comma-separated `x-forwarded-for` list (the
/// original client as recorded by the trusted edge). Requests without a
/// usable header share the [`UNKNOWN_CLIENT`] bucket.
pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
