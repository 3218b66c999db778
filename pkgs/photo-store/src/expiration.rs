//! Expiration reaper - evicts photos past their retention window

use tracing::{debug, info, warn};

use crate::backend::PhotoBackend;
use crate::error::Result;
use crate::photo_store::PhotoStore;
use crate::EXPIRATION_DELTA_MS;

/// Whether a record with `expiration_date` may be evicted at `now`
///
/// The threshold is `expiration_date + EXPIRATION_DELTA_MS`; callers store the
/// raw expiration time without adding the delta themselves.
pub fn is_expired(expiration_date: i64, now: i64) -> bool {
    expiration_date.saturating_add(EXPIRATION_DELTA_MS) < now
}

/// Expiration reaper - full-table sweeps and prefix bulk deletes
///
/// Neither operation is transactional as a whole: every delete commits on its
/// own, so an interrupted run leaves the work done so far in place.
pub struct ExpirationReaper<'a, B: PhotoBackend> {
    store: &'a PhotoStore<B>,
}

impl<B: PhotoBackend> PhotoStore<B> {
    pub fn reaper(&self) -> ExpirationReaper<'_, B> {
        ExpirationReaper { store: self }
    }
}

impl<B: PhotoBackend> ExpirationReaper<'_, B> {
    /// Delete every record that has expired at `now` (epoch milliseconds)
    ///
    /// Walks the whole table in primary-key order and deletes expired rows in
    /// place. Each call is a fresh scan. Returns the number deleted.
    pub async fn sweep_expired(&self, now: i64) -> Result<u64> {
        let backend = &self.store.backend;
        let page_size = self.store.config.cursor_page_size.max(1);

        let mut after = None;
        let mut scanned = 0u64;
        let mut deleted = 0u64;

        loop {
            let rows = backend.cursor_by_id(after, page_size).await?;
            let exhausted = (rows.len() as u64) < page_size;

            for row in rows {
                let Some(id) = row.id else { continue };
                after = Some(id);
                scanned += 1;

                if is_expired(row.expiration_date, now) && backend.delete_by_id(id).await? {
                    debug!("Evicted expired photo {}", row.file_name);
                    deleted += 1;
                }
            }

            if exhausted {
                break;
            }
        }

        info!(
            "Expiration sweep scanned {} photos and evicted {}",
            scanned, deleted
        );
        Ok(deleted)
    }

    /// Sweep using the current wall-clock time
    pub async fn sweep_expired_now(&self) -> Result<u64> {
        self.sweep_expired(chrono::Utc::now().timestamp_millis()).await
    }

    /// File names a sweep at `now` would evict, read from the expiration index
    pub async fn expired_file_names(&self, now: i64) -> Result<Vec<String>> {
        // expiration_date + delta < now  <=>  expiration_date < now - delta
        let before = now.saturating_sub(EXPIRATION_DELTA_MS);
        self.store.backend.range_by_expiration(before).await
    }

    /// Delete every record whose file name starts with `prefix`
    ///
    /// Deletes run one after another; on failure the earlier deletes stay
    /// applied and the error is returned. Returns the number deleted.
    pub async fn bulk_delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let matches = self.store.query_prefix(prefix).await?;
        let total = matches.len();

        let mut deleted = 0u64;
        for record in matches {
            match self.store.delete_by_file_name(&record.file_name).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Bulk delete for {:?} stopped after {} of {}: {}",
                        prefix, deleted, total, e
                    );
                    return Err(e);
                }
            }
        }

        info!("Bulk deleted {} photos under {:?}", deleted, prefix);
        Ok(deleted)
    }
}
