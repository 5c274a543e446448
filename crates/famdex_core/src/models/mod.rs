//! Data models for API requests and persistence.

/// Family catalog models.
pub mod family;

pub use family::{
    Category, CreateFamilyRequest, Family, FamilySummary, GalleryImage, UpdateFamilyRequest,
};
