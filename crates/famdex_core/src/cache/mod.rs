//! Time-boxed listing cache with tag-based invalidation.
//!
//! Only whole-catalog and whole-category listing snapshots are cached.
//! Paginated search results are deliberately not: they change too often and
//! their key space is large, so search always reads through to storage.

/// Mutation-to-tag invalidation policy.
pub mod invalidation;

use crate::error::AppError;
use crate::models::FamilySummary;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Vec<FamilySummary>,
    tags: Vec<String>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// In-process cache of listing snapshots, keyed by canonical query shape.
///
/// Entries expire by TTL or by tag invalidation, whichever comes first. A
/// read that starts after an invalidation completes is guaranteed to miss;
/// reads already in flight may still observe the prior snapshot.
#[derive(Default)]
pub struct ListingCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ListingCache {
    fn state(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are plain snapshots; a poisoned guard is safe to reuse.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("listing cache mutex poisoned; continuing with existing entries");
                poisoned.into_inner()
            }
        }
    }

    /// Return the cached value for `key`, or compute, store, and return it.
    ///
    /// The compute closure runs outside the map lock, so duplicate
    /// concurrent misses may both recompute the same key; the last writer
    /// wins. Compute failures are propagated and nothing is stored.
    ///
    /// # Arguments
    /// - `key`: Canonical cache key.
    /// - `tags`: Invalidation tags to attach to the stored entry.
    /// - `ttl`: Freshness bound for the stored entry.
    /// - `compute`: Fallible producer invoked on miss or expiry.
    ///
    /// # Errors
    /// Propagates the compute closure's error on miss.
    pub fn get_or_compute<F>(
        &self,
        key: &str,
        tags: &[String],
        ttl: Duration,
        compute: F,
    ) -> Result<Vec<FamilySummary>, AppError>
    where
        F: FnOnce() -> Result<Vec<FamilySummary>, AppError>,
    {
        self.get_or_compute_at(key, tags, ttl, Instant::now(), compute)
    }

    /// [`ListingCache::get_or_compute`] with an explicit clock, for TTL tests.
    pub fn get_or_compute_at<F>(
        &self,
        key: &str,
        tags: &[String],
        ttl: Duration,
        now: Instant,
        compute: F,
    ) -> Result<Vec<FamilySummary>, AppError>
    where
        F: FnOnce() -> Result<Vec<FamilySummary>, AppError>,
    {
        {
            let entries = self.state();
            if let Some(entry) = entries.get(key) {
                if entry.is_fresh(now) {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = compute()?;
        let mut entries = self.state();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                tags: tags.to_vec(),
                stored_at: now,
                ttl,
            },
        );
        Ok(value)
    }

    /// Evict every entry whose tag set contains `tag`.
    ///
    /// # Returns
    /// The number of entries evicted.
    pub fn invalidate(&self, tag: &str) -> usize {
        let mut entries = self.state();
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|entry_tag| entry_tag == tag));
        before - entries.len()
    }

    /// Number of live entries, expired or not. Test/diagnostic helper.
    pub fn len(&self) -> usize {
        self.state().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
