//! Sync tracker - per-record intent for the external sync client
//!
//! The store never talks to the remote object store. It only keeps
//! `is_on_s3` and `sync_operation` with each record so the sync client can
//! find work and write back what it did.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::backend::PhotoBackend;
use crate::codec;
use crate::error::Result;
use crate::photo_store::PhotoStore;
use crate::types::{PhotoRecord, SyncOperation};

/// Sync tracker - reads and writes sync intent, never acts on it
pub struct SyncTracker<'a, B: PhotoBackend> {
    store: &'a PhotoStore<B>,
}

impl<B: PhotoBackend> PhotoStore<B> {
    pub fn sync(&self) -> SyncTracker<'_, B> {
        SyncTracker { store: self }
    }
}

impl<B: PhotoBackend> SyncTracker<'_, B> {
    /// Records whose declared intent is `operation`, in file-name order
    pub async fn pending(&self, operation: SyncOperation) -> Result<Vec<PhotoRecord>> {
        let backend = &self.store.backend;
        let page_size = self.store.config.cursor_page_size.max(1);

        let mut after: Option<String> = None;
        let mut matches = Vec::new();
        loop {
            let rows = backend.cursor_by_file_name(after.as_deref(), page_size).await?;
            let exhausted = (rows.len() as u64) < page_size;
            if let Some(last) = rows.last() {
                after = Some(last.file_name.clone());
            }

            matches.extend(
                rows.into_iter()
                    .filter(|row| row.sync_operation == operation)
                    .map(codec::decode),
            );

            if exhausted {
                break;
            }
        }

        debug!("{} photos pending {}", matches.len(), operation);
        Ok(matches)
    }

    /// Number of records per sync operation
    pub async fn summary(&self) -> Result<HashMap<SyncOperation, u64>> {
        let backend = &self.store.backend;
        let page_size = self.store.config.cursor_page_size.max(1);

        let mut counts = HashMap::new();
        let mut after = None;
        loop {
            let rows = backend.cursor_by_id(after, page_size).await?;
            let exhausted = (rows.len() as u64) < page_size;

            for row in &rows {
                *counts.entry(row.sync_operation).or_insert(0) += 1;
            }
            after = rows.last().and_then(|r| r.id);

            if exhausted || after.is_none() {
                break;
            }
        }

        Ok(counts)
    }

    /// Write back the outcome of a sync pass for one record
    ///
    /// Reads the record, sets both sync fields and replaces it whole. Returns
    /// `false` when the record is gone.
    pub async fn record_outcome(
        &self,
        file_name: &str,
        is_on_s3: bool,
        next_operation: SyncOperation,
    ) -> Result<bool> {
        let Some(record) = self.store.get_by_file_name(file_name).await? else {
            debug!("No photo {} to record sync outcome for", file_name);
            return Ok(false);
        };

        self.store
            .put(&record.with_sync_state(is_on_s3, next_operation))
            .await?;

        info!(
            "Recorded sync outcome for {}: on_s3={}, next={}",
            file_name, is_on_s3, next_operation
        );
        Ok(true)
    }
}
