//! Shared constants used across Famdex crates.

/// Default API port for Famdex.
pub const DEFAULT_PORT: u16 = 47311;

/// Default maximum upload size accepted by the API layer.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Minimum search text length after trimming.
pub const MIN_QUERY_LEN: usize = 2;
/// Maximum search text length after trimming.
pub const MAX_QUERY_LEN: usize = 100;

/// Default page size for search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
/// Hard upper bound for requested page sizes.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Admission window shared by all route classes, in seconds.
pub const RATE_WINDOW_SECS: u64 = 60;
/// Search requests admitted per client per window.
pub const SEARCH_QUOTA_PER_WINDOW: u32 = 20;
/// Download requests admitted per client per window.
pub const DOWNLOAD_QUOTA_PER_WINDOW: u32 = 15;

/// Default time-to-live for catalog-wide listing snapshots, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

/// Cache tag covering every listing snapshot.
pub const TAG_FAMILIES: &str = "families";

/// Derived thumbnail width in pixels.
pub const THUMBNAIL_WIDTH: u32 = 400;
/// Derived thumbnail height in pixels.
pub const THUMBNAIL_HEIGHT: u32 = 300;
/// Derived thumbnail JPEG quality (1-100).
pub const THUMBNAIL_QUALITY: u8 = 80;
