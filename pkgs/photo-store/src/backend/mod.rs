//! Storage backends for the photo store
//!
//! The store's indexing, query and eviction logic is written once against
//! [`PhotoBackend`]; a backend only has to provide keyed access, range scans
//! and ordered cursors over its primary and secondary keys.

mod memory;
mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub(crate) use sqlite::sqlite_url;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::StoredPhoto;

/// Capability set every photo table backend provides
///
/// Implementations must open lazily: every method other than `open` may be
/// the first call and must open the table itself, exactly once, even when
/// several callers race.
#[async_trait]
pub trait PhotoBackend: Send + Sync {
    /// Open the table, creating it and its indexes on first run
    async fn open(&self) -> Result<()>;

    /// Exact match on the unique file-name index
    async fn get_by_file_name(&self, file_name: &str) -> Result<Option<StoredPhoto>>;

    /// Insert a new row and return its primary key
    ///
    /// Fails with `UniqueConstraintViolation` if the file name is taken.
    async fn insert(&self, record: StoredPhoto) -> Result<i64>;

    /// Overwrite every field of the row with the same file name, or insert it
    async fn replace(&self, record: StoredPhoto) -> Result<i64>;

    /// Resolve the primary key through the file-name index and delete the row
    ///
    /// Returns `false` when nothing matched.
    async fn delete_by_file_name(&self, file_name: &str) -> Result<bool>;

    /// Delete by primary key; returns `false` when nothing matched
    async fn delete_by_id(&self, id: i64) -> Result<bool>;

    /// Rows with `lower <= file_name < upper` in file-name order
    ///
    /// `upper = None` leaves the range open above.
    async fn range_by_file_name(&self, lower: &str, upper: Option<&str>)
        -> Result<Vec<StoredPhoto>>;

    /// Next `limit` rows in file-name order strictly after `after`
    async fn cursor_by_file_name(&self, after: Option<&str>, limit: u64)
        -> Result<Vec<StoredPhoto>>;

    /// Next `limit` rows in primary-key order strictly after `after`
    async fn cursor_by_id(&self, after: Option<i64>, limit: u64) -> Result<Vec<StoredPhoto>>;

    /// File names of rows with `expiration_date < before`, in expiration order
    async fn range_by_expiration(&self, before: i64) -> Result<Vec<String>>;

    /// Number of stored rows
    async fn count(&self) -> Result<u64>;
}
