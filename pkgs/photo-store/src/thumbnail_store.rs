//! Thumbnail store - low-quality companions kept under a prefixed file name

use tracing::{info, warn};

use crate::backend::PhotoBackend;
use crate::error::{Result, StoreError};
use crate::photo_store::PhotoStore;
use crate::thumbnail::{compress, CompressOptions};
use crate::types::PhotoRecord;
use crate::THUMBNAIL_PREFIX;

/// File name of the thumbnail companion for `file_name`
pub fn thumbnail_name(file_name: &str) -> String {
    format!("{THUMBNAIL_PREFIX}{file_name}")
}

/// Thumbnail store - derives, reads and removes thumbnail companions
///
/// A thumbnail is an independent record; only the file-name mapping ties it
/// to its original.
pub struct ThumbnailStore<'a, B: PhotoBackend> {
    store: &'a PhotoStore<B>,
}

impl<B: PhotoBackend> PhotoStore<B> {
    pub fn thumbnails(&self) -> ThumbnailStore<'_, B> {
        ThumbnailStore { store: self }
    }
}

impl<B: PhotoBackend> ThumbnailStore<'_, B> {
    /// Derive a thumbnail with the configured options and insert it
    pub async fn derive_thumbnail(&self, record: &PhotoRecord) -> Result<String> {
        let options = self.store.config.thumbnail;
        self.derive_thumbnail_with(record, options.max_width, options.max_height)
            .await
    }

    /// Derive a thumbnail fitting `max_width` x `max_height` and insert it
    ///
    /// Returns the thumbnail's file name.
    pub async fn derive_thumbnail_with(
        &self,
        record: &PhotoRecord,
        max_width: u32,
        max_height: u32,
    ) -> Result<String> {
        let options = CompressOptions {
            max_width,
            max_height,
            ..self.store.config.thumbnail
        };
        let payload = compress(&record.payload, options).await?;

        let thumbnail = PhotoRecord {
            file_name: thumbnail_name(&record.file_name),
            mime: payload.mime().to_string(),
            payload,
            ..record.clone()
        };
        self.store.insert(&thumbnail).await?;

        info!(
            "Stored thumbnail mapping: {} -> {}",
            record.file_name, thumbnail.file_name
        );
        Ok(thumbnail.file_name)
    }

    /// Insert the original, then its thumbnail
    ///
    /// If the thumbnail step fails the original stays stored and the failure
    /// is returned as `StoreError::Thumbnail`.
    pub async fn insert_with_thumbnail(&self, record: &PhotoRecord) -> Result<()> {
        self.store.insert(record).await?;
        self.thumbnail_after_insert(record).await
    }

    /// Like [`insert_with_thumbnail`](Self::insert_with_thumbnail), but the
    /// original is downscaled with the configured photo options first
    ///
    /// The thumbnail is derived from the uncompressed payload.
    pub async fn insert_compressed_with_thumbnail(&self, record: &PhotoRecord) -> Result<()> {
        self.store.insert_compressed(record).await?;
        self.thumbnail_after_insert(record).await
    }

    async fn thumbnail_after_insert(&self, record: &PhotoRecord) -> Result<()> {
        if let Err(e) = self.derive_thumbnail(record).await {
            warn!(
                "Stored {} but its thumbnail failed: {}",
                record.file_name, e
            );
            return Err(StoreError::Thumbnail {
                file_name: record.file_name.clone(),
                source: Box::new(e),
            });
        }

        Ok(())
    }

    /// Delete the original and its thumbnail; either may already be gone
    pub async fn delete_with_thumbnail(&self, file_name: &str) -> Result<()> {
        self.store.delete_by_file_name(file_name).await?;
        self.store
            .delete_by_file_name(&thumbnail_name(file_name))
            .await?;
        Ok(())
    }

    /// Thumbnail companion of `file_name`, if stored
    pub async fn get_thumbnail(&self, file_name: &str) -> Result<Option<PhotoRecord>> {
        self.store
            .get_by_file_name(&thumbnail_name(file_name))
            .await
    }

    /// Thumbnails whose original's file name starts with `prefix`
    pub async fn query_thumbnails(&self, prefix: &str) -> Result<Vec<PhotoRecord>> {
        self.store.query_prefix(&thumbnail_name(prefix)).await
    }
}
