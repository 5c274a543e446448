//! Database layer for the family catalog.

/// Family storage helpers.
pub mod family;
/// redb table definitions.
pub mod tables;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

/// Database handle with access to the underlying redb instance.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub families: family::FamilyDb,
}

impl Database {
    /// Open the database directory and initialize tables.
    ///
    /// # Arguments
    /// - `path`: Directory that holds (or will hold) the redb file.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or redb cannot
    /// open the database or tables.
    pub fn new(path: &str) -> Result<Self, AppError> {
        std::fs::create_dir_all(path)
            .map_err(|err| AppError::Storage(format!("Cannot create '{}': {}", path, err)))?;
        let file = Path::new(path).join(tables::REDB_FILE_NAME);
        let db = Arc::new(redb::Database::create(file)?);
        Ok(Self {
            families: family::FamilyDb::new(db.clone())?,
            db,
        })
    }
}
