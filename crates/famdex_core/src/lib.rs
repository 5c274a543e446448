//! Core domain library for Famdex (config, storage, search, caching).

/// Listing cache with tag-based invalidation.
pub mod cache;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across Famdex crates.
pub mod constants;
/// Database access layer.
pub mod db;
/// Application error types (storage/domain).
pub mod error;
/// Media storage collaborator (bytes in, stable URLs out).
pub mod media;
/// Data models for API requests and persistence.
pub mod models;
/// External-input validation for search and identifiers.
pub mod query;
/// Fixed-window request admission control.
pub mod ratelimit;
/// Search orchestration (admission, validation, repository).
pub mod search;

pub use cache::ListingCache;
pub use config::Config;
pub use db::Database;
pub use error::AppError;
pub use ratelimit::RateLimiter;
pub use search::SearchService;
