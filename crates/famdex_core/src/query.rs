//! Validation of external search/listing input into typed, safe values.
//!
//! Everything arriving from query strings is untrusted. This module is the
//! single place where raw parameters become typed values: search text and
//! identifiers are rejected when malformed, pagination is defaulted
//! permissively and clamped.

use crate::constants::{
    DEFAULT_SEARCH_LIMIT, MAX_QUERY_LEN, MAX_SEARCH_LIMIT, MIN_QUERY_LEN,
};
use crate::error::AppError;
use crate::models::Category;
use std::str::FromStr;

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed search text, `MIN_QUERY_LEN..=MAX_QUERY_LEN` chars.
    pub text: String,
    /// Sorted, deduped tag filter; empty means no tag filtering.
    pub tags: Vec<String>,
    /// 1-based page number.
    pub page: usize,
    /// Page size, `1..=MAX_SEARCH_LIMIT`.
    pub limit: usize,
}

/// Parse and validate raw search parameters.
///
/// Text is mandatory and length-checked; tags/page/limit are permissive
/// (tags default to empty, page to 1, limit to the default clamped at the
/// maximum). Validation happens before any store access.
///
/// # Arguments
/// - `text`: Raw `q` parameter.
/// - `tags`: Raw comma-separated `tags` parameter.
/// - `page`: Raw `page` parameter.
/// - `limit`: Raw `limit` parameter.
///
/// # Returns
/// A validated [`SearchQuery`].
///
/// # Errors
/// Returns [`AppError::InvalidQuery`] when `text` is missing or its trimmed
/// length is out of bounds.
pub fn parse_search_query(
    text: Option<&str>,
    tags: Option<&str>,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<SearchQuery, AppError> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.chars().count() < MIN_QUERY_LEN {
        return Err(AppError::InvalidQuery(format!(
            "Search text must be at least {} characters",
            MIN_QUERY_LEN
        )));
    }
    if text.chars().count() > MAX_QUERY_LEN {
        return Err(AppError::InvalidQuery(format!(
            "Search text must be at most {} characters",
            MAX_QUERY_LEN
        )));
    }

    Ok(SearchQuery {
        text: text.to_string(),
        tags: canonicalize_tags(tags),
        page: parse_page(page),
        limit: parse_limit(limit),
    })
}

/// Split a raw comma-separated tag list into a canonical filter set.
///
/// Tags are trimmed, empties dropped, then sorted and deduped so the same
/// logical filter always produces the same cache key.
pub fn canonicalize_tags(raw: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| *limit >= 1)
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT)
}

/// Parse a category parameter against the closed enum.
///
/// # Errors
/// Returns [`AppError::InvalidQuery`] unless the value exactly matches one
/// of the category wire names (case-sensitive).
pub fn parse_category(raw: &str) -> Result<Category, AppError> {
    Category::from_str(raw)
        .map_err(|_| AppError::InvalidQuery(format!("Unknown category '{}'", raw)))
}

/// Validate a family slug.
///
/// Slugs are 3–100 chars of lowercase letters, digits, and hyphens. The
/// character set rules out path traversal and injection by construction.
///
/// # Returns
/// The trimmed slug.
///
/// # Errors
/// Returns [`AppError::InvalidQuery`] for out-of-bounds length or any
/// character outside the allowed set.
pub fn validate_slug(raw: &str) -> Result<&str, AppError> {
    let slug = raw.trim();
    if slug.len() < 3 || slug.len() > 100 {
        return Err(AppError::InvalidQuery(
            "Identifier must be 3-100 characters".to_string(),
        ));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(AppError::InvalidQuery(
            "Identifier may only contain lowercase letters, digits, and hyphens".to_string(),
        ));
    }
    Ok(slug)
}

/// Canonical cache key for a validated search query.
///
/// Not currently used to cache paginated results (see the cache module),
/// but defined here so the key derivation lives next to the validation
/// that canonicalizes its inputs.
pub fn search_cache_key(query: &SearchQuery) -> String {
    format!(
        "search:{}|{}|{}|{}",
        query.text.to_lowercase(),
        query.tags.join(","),
        query.page,
        query.limit
    )
}

/// Cache key for the whole-catalog listing snapshot.
pub fn catalog_cache_key() -> String {
    "families:all".to_string()
}

/// Cache key for a per-category listing snapshot.
pub fn category_cache_key(category: Category) -> String {
    format!("families:category:{}", category)
}
