//! Search orchestration: admission, validation, repository, response shape.

use crate::db::Database;
use crate::error::AppError;
use crate::models::Family;
use crate::query::{self, SearchQuery};
use crate::ratelimit::{RateLimiter, RouteClass};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw, untrusted search parameters as they arrive from the query string.
///
/// `page`/`limit` stay strings here so malformed values fall back to
/// pagination defaults instead of failing deserialization.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub tags: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Pagination metadata attached to every search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

impl Pagination {
    fn for_page(query: &SearchQuery, total: usize) -> Self {
        Self {
            total,
            page: query.page,
            limit: query.limit,
            has_more: query.page * query.limit < total,
            total_pages: total.div_ceil(query.limit),
        }
    }
}

/// A completed search: response payload plus the quota left for headers.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub data: Vec<Family>,
    pub pagination: Pagination,
    /// The validated, trimmed query text, echoed back to the caller.
    pub query: String,
    /// The canonical tag filter; empty when no filter was applied.
    pub tags: Vec<String>,
    /// Requests left in the caller's current admission window.
    pub remaining: u32,
}

/// Orchestrates one search request: admit, validate, fetch, shape.
///
/// Quota is consumed before validation, so malformed queries still count
/// against the caller's window; both failures are reported before any store
/// access.
pub struct SearchService {
    db: Arc<Database>,
    limiter: Arc<RateLimiter>,
}

impl SearchService {
    /// Build a service over the shared database and admission gate.
    pub fn new(db: Arc<Database>, limiter: Arc<RateLimiter>) -> Self {
        Self { db, limiter }
    }

    /// Run one search request for `client_id`.
    ///
    /// # Arguments
    /// - `raw`: Untrusted query-string parameters.
    /// - `client_id`: Trusted client identity for admission control.
    ///
    /// # Returns
    /// A [`SearchOutcome`] ready for the HTTP layer.
    ///
    /// # Errors
    /// [`AppError::RateLimited`] when the admission window is exhausted,
    /// [`AppError::InvalidQuery`] when the search text is malformed, or a
    /// storage error from the repository.
    pub fn search(&self, raw: &RawSearchParams, client_id: &str) -> Result<SearchOutcome, AppError> {
        let admission = self.limiter.admit(client_id, RouteClass::Search);
        if !admission.allowed {
            return Err(AppError::RateLimited {
                limit: admission.limit,
                retry_after_secs: admission.retry_after_secs,
            });
        }

        let query = query::parse_search_query(
            raw.q.as_deref(),
            raw.tags.as_deref(),
            raw.page.as_deref(),
            raw.limit.as_deref(),
        )?;

        let page = self.db.families.search(&query)?;
        let pagination = Pagination::for_page(&query, page.total);
        Ok(SearchOutcome {
            data: page.rows,
            pagination,
            query: query.text,
            tags: query.tags,
            remaining: admission.remaining,
        })
    }
}
