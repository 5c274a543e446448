//! HTTP request handlers.

/// Family CRUD, listing, and download endpoints.
pub mod family;
/// Gallery image endpoints.
pub mod gallery;
/// Catalog search endpoint.
pub mod search;
