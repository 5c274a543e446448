//! Helper functions shared by family storage operations.

use crate::models::family::*;
use chrono::{DateTime, Utc};

pub(crate) fn reverse_timestamp_key(updated_at: DateTime<Utc>) -> u64 {
    // Pre-epoch timestamps are clamped to preserve total ordering semantics
    // for expected runtime data while avoiding negative->u64 underflow.
    let millis = updated_at.timestamp_millis().max(0) as u64;
    u64::MAX.saturating_sub(millis)
}

pub(crate) fn apply_update_request(family: &mut Family, update: &UpdateFamilyRequest) {
    if let Some(name) = &update.name {
        family.name = name.clone();
    }
    if let Some(category) = update.category {
        family.category = category;
    }
    if let Some(description) = &update.description {
        family.description = description.clone();
    }
    if let Some(tags) = &update.tags {
        family.tags = tags.clone();
    }
    if let Some(download_url) = &update.download_url {
        family.download_url = download_url.clone();
    }
    if let Some(file_size_bytes) = update.file_size_bytes {
        family.file_size_bytes = file_size_bytes;
    }
    if let Some(versions) = &update.versions {
        family.versions = versions.clone();
    }
    family.updated_at = Utc::now();
}

/// Substring/tag-intersection predicate for one row.
///
/// A row matches when the lowercased text appears in its name, description,
/// or any tag, and (when a tag filter is present) the row shares at least
/// one tag with the filter.
pub(super) fn matches_query(family: &Family, query_lower: &str, tag_filter: &[String]) -> bool {
    let text_hit = contains_case_insensitive(&family.name, query_lower)
        || contains_case_insensitive(&family.description, query_lower)
        || family
            .tags
            .iter()
            .any(|tag| contains_case_insensitive(tag, query_lower));
    if !text_hit {
        return false;
    }
    if tag_filter.is_empty() {
        return true;
    }
    family.tags.iter().any(|tag| {
        tag_filter
            .iter()
            .any(|filter| filter.eq_ignore_ascii_case(tag))
    })
}

pub(super) fn score_family_match(family: &Family, query_lower: &str) -> i32 {
    let mut score = 0;
    if contains_case_insensitive(&family.name, query_lower) {
        score += 10;
    }
    if family
        .tags
        .iter()
        .any(|tag| contains_case_insensitive(tag, query_lower))
    {
        score += 5;
    }
    if contains_case_insensitive(&family.description, query_lower) {
        score += 1;
    }
    score
}

fn contains_case_insensitive(haystack: &str, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    if query_lower.is_ascii() {
        let needle = query_lower.as_bytes();
        let hay = haystack.as_bytes();
        if needle.len() > hay.len() {
            return false;
        }
        for idx in 0..=hay.len() - needle.len() {
            if hay[idx..idx + needle.len()]
                .iter()
                .map(u8::to_ascii_lowercase)
                .eq(needle.iter().copied())
            {
                return true;
            }
        }
        return false;
    }
    haystack.to_lowercase().contains(query_lower)
}

pub(crate) fn deserialize_family(bytes: &[u8]) -> Result<Family, bincode::Error> {
    bincode::deserialize(bytes)
}

pub(super) fn deserialize_summary(bytes: &[u8]) -> Result<FamilySummary, bincode::Error> {
    bincode::deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::{matches_query, reverse_timestamp_key, score_family_match};
    use crate::models::{Category, Family};
    use chrono::{TimeZone, Utc};

    fn family_with(name: &str, description: &str, tags: &[&str]) -> Family {
        let mut family = Family::new(
            "test-family".to_string(),
            name.to_string(),
            Category::Furniture,
            description.to_string(),
        );
        family.tags = tags.iter().map(|tag| tag.to_string()).collect();
        family
    }

    #[test]
    fn reverse_timestamp_key_clamps_pre_epoch_values() {
        let pre_epoch = Utc
            .with_ymd_and_hms(1960, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(reverse_timestamp_key(pre_epoch), u64::MAX);
    }

    #[test]
    fn predicate_matches_name_description_or_tag() {
        let by_name = family_with("Oak Chair", "plain", &[]);
        let by_description = family_with("plain", "a chair for offices", &[]);
        let by_tag = family_with("plain", "plain", &["chair"]);
        let no_match = family_with("plain", "plain", &["table"]);

        for family in [&by_name, &by_description, &by_tag] {
            assert!(matches_query(family, "chair", &[]));
        }
        assert!(!matches_query(&no_match, "chair", &[]));
    }

    #[test]
    fn tag_filter_requires_at_least_one_shared_tag() {
        let shares_one = family_with("Oak Chair", "", &["oak", "seating"]);
        let shares_none = family_with("Pine Chair", "", &["pine"]);
        let filter = vec!["seating".to_string(), "steel".to_string()];

        assert!(matches_query(&shares_one, "chair", &filter));
        assert!(!matches_query(&shares_none, "chair", &filter));
    }

    #[test]
    fn score_prefers_name_over_tag_over_description() {
        let name_hit = family_with("Bar Stool", "", &[]);
        let tag_hit = family_with("Seat", "", &["stool"]);
        let description_hit = family_with("Seat", "a short stool", &[]);

        let name_score = score_family_match(&name_hit, "stool");
        let tag_score = score_family_match(&tag_hit, "stool");
        let description_score = score_family_match(&description_hit, "stool");
        assert!(name_score > tag_score);
        assert!(tag_score > description_score);
        assert!(description_score > 0);
    }
}
