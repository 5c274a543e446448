//! Family storage operations backed by redb.

mod helpers;

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_QUALITY, THUMBNAIL_WIDTH};
use crate::media::thumbnail_url;
use crate::models::family::*;
use crate::query::SearchQuery;
use crate::{db::tables::*, error::AppError};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

use self::helpers::{
    apply_update_request, deserialize_family, deserialize_summary, matches_query,
    reverse_timestamp_key, score_family_match,
};

/// One page of search results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// At most `limit` rows in deterministic order.
    pub rows: Vec<Family>,
    /// Count of every predicate match, independent of the page window.
    pub total: usize,
}

/// Accessor for family-related redb tables.
pub struct FamilyDb {
    db: Arc<redb::Database>,
}

impl FamilyDb {
    /// Initialize family tables if they do not exist yet.
    ///
    /// # Returns
    /// A new [`FamilyDb`] accessor bound to `db`.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(FAMILIES)?;
        write_txn.open_table(FAMILIES_META)?;
        write_txn.open_table(FAMILIES_BY_UPDATED)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a new family row and derived summary/index rows atomically.
    ///
    /// # Arguments
    /// - `family`: Family row to persist.
    ///
    /// # Returns
    /// `Ok(())` when the insert commits.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when the slug is already taken, or a
    /// storage/serialization error.
    pub fn create(&self, family: &Family) -> Result<(), AppError> {
        let encoded_family = bincode::serialize(family)?;
        let summary = FamilySummary::from(family);
        let encoded_summary = bincode::serialize(&summary)?;
        let recency_key = reverse_timestamp_key(family.updated_at);

        let write_txn = self.db.begin_write()?;
        {
            let mut families = write_txn.open_table(FAMILIES)?;
            let mut summaries = write_txn.open_table(FAMILIES_META)?;
            let mut updated = write_txn.open_table(FAMILIES_BY_UPDATED)?;

            if families.get(family.slug.as_str())?.is_some() {
                return Err(AppError::Conflict(format!(
                    "Family slug '{}' already exists",
                    family.slug
                )));
            }

            families.insert(family.slug.as_str(), encoded_family.as_slice())?;
            summaries.insert(family.slug.as_str(), encoded_summary.as_slice())?;
            updated.insert((recency_key, family.slug.as_str()), ())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch a family by slug.
    ///
    /// # Returns
    /// `Ok(Some(family))` when found, `Ok(None)` when missing.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, slug: &str) -> Result<Option<Family>, AppError> {
        let read_txn = self.db.begin_read()?;
        let families = read_txn.open_table(FAMILIES)?;
        match families.get(slug)? {
            Some(value) => Ok(Some(deserialize_family(value.value())?)),
            None => Ok(None),
        }
    }

    /// Apply a partial update to a family.
    ///
    /// # Arguments
    /// - `slug`: Family to update.
    /// - `update`: Update payload.
    ///
    /// # Returns
    /// `Ok(Some((updated, old_category)))` when updated (the pre-update
    /// category feeds cache invalidation), `Ok(None)` when missing.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn update(
        &self,
        slug: &str,
        update: &UpdateFamilyRequest,
    ) -> Result<Option<(Family, Category)>, AppError> {
        self.mutate(slug, true, |family| {
            let old_category = family.category;
            apply_update_request(family, update);
            Ok(old_category)
        })
    }

    /// Delete a family and return the removed canonical row.
    ///
    /// # Returns
    /// `Ok(Some(family))` when deleted, `Ok(None)` when missing.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn delete(&self, slug: &str) -> Result<Option<Family>, AppError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut families = write_txn.open_table(FAMILIES)?;
            let mut summaries = write_txn.open_table(FAMILIES_META)?;
            let mut updated = write_txn.open_table(FAMILIES_BY_UPDATED)?;

            let Some(old_guard) = families.get(slug)? else {
                return Ok(None);
            };
            let family = deserialize_family(old_guard.value())?;
            let recency_key = reverse_timestamp_key(family.updated_at);
            drop(old_guard);

            let _ = updated.remove((recency_key, slug))?;
            let _ = families.remove(slug)?;
            let _ = summaries.remove(slug)?;
            Some(family)
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Search canonical family rows with the substring/tag predicate.
    ///
    /// Matches are ordered by match score (name over tag over description),
    /// then recency, then slug, so ordering is total and repeatable. `total`
    /// counts every match; `rows` is the requested page window. A page past
    /// the end yields empty rows with the correct total.
    ///
    /// # Arguments
    /// - `query`: Validated search parameters.
    ///
    /// # Returns
    /// One [`SearchPage`].
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchPage, AppError> {
        let query_lower = query.text.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let families_table = read_txn.open_table(FAMILIES)?;
        let mut matches: Vec<(i32, DateTime<Utc>, Family)> = Vec::new();

        for item in families_table.iter()? {
            let (_, value) = item?;
            let family = deserialize_family(value.value())?;
            if !matches_query(&family, &query_lower, &query.tags) {
                continue;
            }
            let score = score_family_match(&family, &query_lower);
            matches.push((score, family.updated_at, family));
        }

        matches.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.slug.cmp(&b.2.slug))
        });

        let total = matches.len();
        let start = (query.page - 1).saturating_mul(query.limit).min(total);
        let end = start.saturating_add(query.limit).min(total);
        let rows = matches
            .into_iter()
            .skip(start)
            .take(end - start)
            .map(|(_, _, family)| family)
            .collect();

        Ok(SearchPage { rows, total })
    }

    /// List family summaries using the recency index.
    ///
    /// # Arguments
    /// - `category`: Optional category filter.
    ///
    /// # Returns
    /// Summary rows in descending `updated_at` order.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_summaries(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<FamilySummary>, AppError> {
        let read_txn = self.db.begin_read()?;
        let updated_table = read_txn.open_table(FAMILIES_BY_UPDATED)?;
        let summary_table = read_txn.open_table(FAMILIES_META)?;

        let mut summaries = Vec::new();
        for item in updated_table.iter()? {
            let (key, _) = item?;
            let (_, slug) = key.value();
            let Some(summary_guard) = summary_table.get(slug)? else {
                continue;
            };
            let summary = deserialize_summary(summary_guard.value())?;
            if let Some(filter) = category {
                if summary.category != filter {
                    continue;
                }
            }
            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// Increment the download counter and return the updated row.
    ///
    /// Counter bumps do not touch `updated_at`, so listing order is stable
    /// under download traffic.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn record_download(&self, slug: &str) -> Result<Option<Family>, AppError> {
        self.mutate(slug, false, |family| {
            family.download_count += 1;
            Ok(())
        })
        .map(|outcome| outcome.map(|(family, _)| family))
    }

    /// Increment the view counter.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn record_view(&self, slug: &str) -> Result<Option<Family>, AppError> {
        self.mutate(slug, false, |family| {
            family.view_count += 1;
            Ok(())
        })
        .map(|outcome| outcome.map(|(family, _)| family))
    }

    /// Append an image to a family's gallery.
    ///
    /// The image lands at the end of the gallery. The first image of an
    /// otherwise image-less family also becomes its thumbnail (derived CDN
    /// transformation of the stored URL).
    ///
    /// # Arguments
    /// - `slug`: Owning family.
    /// - `url`: Stable image URL from the media store.
    /// - `caption`: Optional caption.
    ///
    /// # Returns
    /// `Ok(Some((updated, image)))` when appended, `Ok(None)` when the
    /// family is missing.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn add_gallery_image(
        &self,
        slug: &str,
        url: &str,
        caption: Option<String>,
    ) -> Result<Option<(Family, GalleryImage)>, AppError> {
        let mut appended: Option<GalleryImage> = None;
        let outcome = self.mutate(slug, false, |family| {
            let image = GalleryImage::new(url.to_string(), caption.clone(), family.gallery.len());
            if family.thumbnail_url.is_none() {
                family.thumbnail_url = Some(thumbnail_url(
                    url,
                    THUMBNAIL_WIDTH,
                    THUMBNAIL_HEIGHT,
                    THUMBNAIL_QUALITY,
                ));
            }
            family.gallery.push(image.clone());
            appended = Some(image);
            Ok(())
        })?;
        Ok(outcome.and_then(|(family, _)| appended.map(|image| (family, image))))
    }

    /// Remove a gallery image by id and compact positions.
    ///
    /// The thumbnail is re-derived from the new first image, or cleared
    /// when the gallery empties.
    ///
    /// # Returns
    /// `Ok(Some(updated))` when removed, `Ok(None)` when the family is
    /// missing.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the family exists but the image
    /// id does not, or a storage/serialization error.
    pub fn remove_gallery_image(
        &self,
        slug: &str,
        image_id: &str,
    ) -> Result<Option<Family>, AppError> {
        self.mutate(slug, false, |family| {
            let before = family.gallery.len();
            family.gallery.retain(|image| image.id != image_id);
            if family.gallery.len() == before {
                return Err(AppError::NotFound);
            }
            for (position, image) in family.gallery.iter_mut().enumerate() {
                image.position = position;
            }
            family.thumbnail_url = family.gallery.first().map(|image| {
                thumbnail_url(
                    &image.url,
                    THUMBNAIL_WIDTH,
                    THUMBNAIL_HEIGHT,
                    THUMBNAIL_QUALITY,
                )
            });
            Ok(())
        })
        .map(|outcome| outcome.map(|(family, _)| family))
    }

    /// Read-modify-write one family row inside a single write transaction,
    /// keeping the summary table and (when `reindex` is set and the
    /// timestamp moved) the recency index in sync.
    fn mutate<T>(
        &self,
        slug: &str,
        reindex: bool,
        apply: impl FnOnce(&mut Family) -> Result<T, AppError>,
    ) -> Result<Option<(Family, T)>, AppError> {
        let write_txn = self.db.begin_write()?;
        let updated_family = {
            let mut families = write_txn.open_table(FAMILIES)?;
            let mut summaries = write_txn.open_table(FAMILIES_META)?;
            let mut updated = write_txn.open_table(FAMILIES_BY_UPDATED)?;

            let Some(old_guard) = families.get(slug)? else {
                return Ok(None);
            };
            let mut family = deserialize_family(old_guard.value())?;
            let old_recency_key = reverse_timestamp_key(family.updated_at);
            drop(old_guard);

            let extra = apply(&mut family)?;

            let encoded_family = bincode::serialize(&family)?;
            let summary = FamilySummary::from(&family);
            let encoded_summary = bincode::serialize(&summary)?;
            let new_recency_key = reverse_timestamp_key(family.updated_at);

            families.insert(slug, encoded_family.as_slice())?;
            summaries.insert(slug, encoded_summary.as_slice())?;
            if reindex && old_recency_key != new_recency_key {
                let _ = updated.remove((old_recency_key, slug))?;
                updated.insert((new_recency_key, slug), ())?;
            }

            Some((family, extra))
        };

        write_txn.commit()?;
        Ok(updated_family)
    }
}

#[cfg(test)]
mod tests;
