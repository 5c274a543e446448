//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Canonical family rows keyed by slug (`Family`, bincode-encoded).
pub const FAMILIES: TableDefinition<&str, &[u8]> = TableDefinition::new("families");
/// Family listing rows keyed by slug (`FamilySummary`, bincode-encoded).
pub const FAMILIES_META: TableDefinition<&str, &[u8]> = TableDefinition::new("families_meta");
/// Recency index ordered by reverse-millis then slug.
pub const FAMILIES_BY_UPDATED: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("families_by_updated");
