//! Single invalidation policy mapping catalog mutations to cache tags.
//!
//! Every mutation endpoint funnels through [`invalidate_after_change`]
//! after its write commits, so the tag policy is defined and tested in one
//! place instead of being repeated at each call site.

use super::ListingCache;
use crate::constants::TAG_FAMILIES;
use crate::models::Category;

/// Cache tag for one category's listing snapshot.
pub fn category_tag(category: Category) -> String {
    format!("category-{}", category)
}

/// Cache tag for one family's detail snapshot.
pub fn family_tag(slug: &str) -> String {
    format!("family-{}", slug)
}

/// A committed catalog mutation, as seen by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogChange {
    FamilyCreated {
        category: Category,
    },
    FamilyUpdated {
        slug: String,
        old_category: Category,
        new_category: Category,
    },
    FamilyDeleted {
        slug: String,
        category: Category,
    },
    ImageAdded {
        slug: String,
    },
    ImageRemoved {
        slug: String,
    },
}

/// Compute the tag set to evict for a committed change.
///
/// Family-level changes evict the global listing, the affected category
/// listing(s), and the per-family detail tag. Gallery changes touch only
/// the owning family's detail tag: listings do not embed galleries.
pub fn tags_for_change(change: &CatalogChange) -> Vec<String> {
    match change {
        CatalogChange::FamilyCreated { category } => {
            vec![TAG_FAMILIES.to_string(), category_tag(*category)]
        }
        CatalogChange::FamilyUpdated {
            slug,
            old_category,
            new_category,
        } => {
            let mut tags = vec![
                TAG_FAMILIES.to_string(),
                category_tag(*old_category),
                family_tag(slug),
            ];
            if new_category != old_category {
                tags.insert(2, category_tag(*new_category));
            }
            tags
        }
        CatalogChange::FamilyDeleted { slug, category } => {
            vec![
                TAG_FAMILIES.to_string(),
                category_tag(*category),
                family_tag(slug),
            ]
        }
        CatalogChange::ImageAdded { slug } | CatalogChange::ImageRemoved { slug } => {
            vec![family_tag(slug)]
        }
    }
}

/// Apply the invalidation policy for a committed change.
///
/// Invalidation runs after the write has committed and can never fail the
/// mutation; the eviction outcome is only logged.
pub fn invalidate_after_change(cache: &ListingCache, change: &CatalogChange) {
    let tags = tags_for_change(change);
    let mut evicted = 0;
    for tag in &tags {
        evicted += cache.invalidate(tag);
    }
    tracing::debug!(?change, evicted, "cache invalidated after mutation");
}
