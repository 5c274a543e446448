//! Family catalog models and the listing projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of catalog categories.
///
/// Wire and storage representation is the lowercase name; parsing is exact
/// and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Furniture,
    Doors,
    Windows,
    Lighting,
    Plumbing,
    Electrical,
    Structure,
    Casework,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Category::Furniture,
        Category::Doors,
        Category::Windows,
        Category::Lighting,
        Category::Plumbing,
        Category::Electrical,
        Category::Structure,
        Category::Casework,
    ];

    /// Return the wire/storage name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Furniture => "furniture",
            Category::Doors => "doors",
            Category::Windows => "windows",
            Category::Lighting => "lighting",
            Category::Plumbing => "plumbing",
            Category::Electrical => "electrical",
            Category::Structure => "structure",
            Category::Casework => "casework",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or(())
    }
}

/// One image in a family's ordered gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    pub caption: Option<String>,
    /// Dense 0..n position within the gallery; compacted on removal.
    pub position: usize,
}

impl GalleryImage {
    /// Create a gallery image with a fresh id at the given position.
    pub fn new(url: String, caption: Option<String>, position: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            caption,
            position,
        }
    }
}

/// Canonical family row stored in the database and returned by search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub tags: Vec<String>,
    pub download_count: u64,
    pub view_count: u64,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub download_url: String,
    pub file_size_bytes: u64,
    /// Compatible Revit version labels, e.g. `"2023"`.
    pub versions: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub gallery: Vec<GalleryImage>,
}

/// Lightweight family projection used by listing and cache snapshots.
///
/// Listings never embed the gallery or description body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub download_count: u64,
    pub view_count: u64,
    pub file_size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a family.
#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub slug: String,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub tags: Option<Vec<String>>,
    pub download_url: String,
    pub file_size_bytes: u64,
    pub versions: Option<Vec<String>>,
}

/// Request payload for partially updating a family.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFamilyRequest {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub download_url: Option<String>,
    pub file_size_bytes: Option<u64>,
    pub versions: Option<Vec<String>>,
}

impl Family {
    /// Create a new family row with fresh identity and zeroed counters.
    ///
    /// # Arguments
    /// - `slug`: Validated catalog slug (see [`crate::query::validate_slug`]).
    /// - `name`: Display name.
    /// - `category`: Catalog category.
    /// - `description`: Long-form description.
    ///
    /// # Returns
    /// A new [`Family`] with `uploaded_at == updated_at == now`.
    pub fn new(slug: String, name: String, category: Category, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug,
            name,
            category,
            description,
            tags: Vec::new(),
            download_count: 0,
            view_count: 0,
            uploaded_at: now,
            updated_at: now,
            download_url: String::new(),
            file_size_bytes: 0,
            versions: Vec::new(),
            thumbnail_url: None,
            gallery: Vec::new(),
        }
    }
}

impl From<&Family> for FamilySummary {
    fn from(value: &Family) -> Self {
        Self {
            id: value.id.clone(),
            slug: value.slug.clone(),
            name: value.name.clone(),
            category: value.category,
            tags: value.tags.clone(),
            thumbnail_url: value.thumbnail_url.clone(),
            download_count: value.download_count,
            view_count: value.view_count,
            file_size_bytes: value.file_size_bytes,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Family, FamilySummary};
    use std::str::FromStr;

    #[test]
    fn category_round_trips_through_wire_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Ok(category));
        }
    }

    #[test]
    fn category_parsing_is_exact_and_case_sensitive() {
        assert!(Category::from_str("Doors").is_err());
        assert!(Category::from_str(" doors").is_err());
        assert!(Category::from_str("door").is_err());
        assert!(Category::from_str("").is_err());
    }

    #[test]
    fn summary_projection_drops_gallery_and_description() {
        let mut family = Family::new(
            "oak-side-chair".to_string(),
            "Oak Side Chair".to_string(),
            Category::Furniture,
            "A parametric oak side chair.".to_string(),
        );
        family.tags = vec!["chair".to_string(), "oak".to_string()];
        family.thumbnail_url = Some("/media/thumb.png".to_string());

        let summary = FamilySummary::from(&family);
        assert_eq!(summary.slug, "oak-side-chair");
        assert_eq!(summary.category, Category::Furniture);
        assert_eq!(summary.tags, family.tags);
        assert_eq!(summary.thumbnail_url, family.thumbnail_url);
        let encoded = serde_json::to_string(&summary).expect("serialize summary");
        assert!(!encoded.contains("description"));
        assert!(!encoded.contains("gallery"));
    }
}
