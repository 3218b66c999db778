//! Photo store - keyed CRUD over the photo table

use std::path::PathBuf;
use tracing::{debug, info};

use crate::backend::{MemoryBackend, PhotoBackend, SqliteBackend};
use crate::codec;
use crate::error::Result;
use crate::thumbnail;
use crate::types::PhotoRecord;
use crate::PhotoStoreConfig;

/// Photo store - indexed photo table with lazy open
///
/// Callers address records by file name only. The backend is opened on the
/// first operation; [`PhotoStore::open`] may be called up front to surface
/// `StoreUnavailable` early.
#[derive(Debug)]
pub struct PhotoStore<B: PhotoBackend = SqliteBackend> {
    pub(crate) backend: B,
    pub(crate) config: PhotoStoreConfig,
}

impl PhotoStore<SqliteBackend> {
    /// Create a SQLite-backed store with default config
    pub fn new(db_path: PathBuf) -> Self {
        Self::with_config(PhotoStoreConfig {
            db_path,
            ..Default::default()
        })
    }

    /// Create a SQLite-backed store with custom config
    pub fn with_config(config: PhotoStoreConfig) -> Self {
        let backend = SqliteBackend::new(config.database_url());
        Self { backend, config }
    }
}

impl PhotoStore<MemoryBackend> {
    /// Create a store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::with_backend(MemoryBackend::new(), PhotoStoreConfig::default())
    }
}

impl<B: PhotoBackend> PhotoStore<B> {
    pub fn with_backend(backend: B, config: PhotoStoreConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &PhotoStoreConfig {
        &self.config
    }

    /// Open the table; later calls and concurrent callers share the first open
    pub async fn open(&self) -> Result<()> {
        self.backend.open().await
    }

    /// Insert a new record
    ///
    /// `None` is accepted and ignored, returning `Ok(false)`. A taken file name
    /// fails with `UniqueConstraintViolation`.
    pub async fn insert<'a>(&self, record: impl Into<Option<&'a PhotoRecord>>) -> Result<bool> {
        let Some(record) = record.into() else {
            debug!("Ignoring insert of absent record");
            return Ok(false);
        };

        let stored = codec::encode(record).await?;
        let size = stored.payload.len();
        self.backend.insert(stored).await?;

        debug!("Stored photo {} ({} bytes)", record.file_name, size);
        Ok(true)
    }

    /// Insert after downscaling the payload with the configured photo options
    pub async fn insert_compressed(&self, record: &PhotoRecord) -> Result<()> {
        let compressed = thumbnail::compress(&record.payload, self.config.compression).await?;

        let record = PhotoRecord {
            mime: compressed.mime().to_string(),
            payload: compressed,
            ..record.clone()
        };
        self.insert(&record).await?;
        Ok(())
    }

    /// Replace the whole record with the same file name, inserting it if absent
    pub async fn put(&self, record: &PhotoRecord) -> Result<()> {
        let stored = codec::encode(record).await?;
        self.backend.replace(stored).await?;

        debug!(
            "Put photo {} (on_s3={}, op={})",
            record.file_name, record.is_on_s3, record.sync_operation
        );
        Ok(())
    }

    /// Look up a record by exact file name
    pub async fn get_by_file_name(&self, file_name: &str) -> Result<Option<PhotoRecord>> {
        let stored = self.backend.get_by_file_name(file_name).await?;
        Ok(stored.map(codec::decode))
    }

    /// Delete a record by file name; a missing record is not an error
    pub async fn delete_by_file_name(&self, file_name: &str) -> Result<bool> {
        let deleted = self.backend.delete_by_file_name(file_name).await?;

        if deleted {
            info!("Deleted photo {}", file_name);
        } else {
            debug!("No photo {} to delete", file_name);
        }
        Ok(deleted)
    }

    /// Number of stored records, thumbnails included
    pub async fn count(&self) -> Result<u64> {
        self.backend.count().await
    }
}
