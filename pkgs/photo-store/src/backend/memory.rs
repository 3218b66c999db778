//! In-memory backend with explicit secondary indexes

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use super::PhotoBackend;
use crate::error::{Result, StoreError};
use crate::types::StoredPhoto;

#[derive(Debug, Default)]
struct MemoryTable {
    next_id: i64,
    rows: BTreeMap<i64, StoredPhoto>,
    /// Unique index: file name -> primary key
    file_names: BTreeMap<String, i64>,
    /// Non-unique index: expiration date -> primary keys
    expirations: BTreeMap<i64, BTreeSet<i64>>,
}

impl MemoryTable {
    fn put_row(&mut self, id: i64, mut record: StoredPhoto) {
        record.id = Some(id);
        self.file_names.insert(record.file_name.clone(), id);
        self.expirations
            .entry(record.expiration_date)
            .or_default()
            .insert(id);
        self.rows.insert(id, record);
    }

    fn insert_row(&mut self, record: StoredPhoto) -> Result<i64> {
        if self.file_names.contains_key(&record.file_name) {
            return Err(StoreError::UniqueConstraintViolation(record.file_name));
        }

        self.next_id += 1;
        let id = self.next_id;
        self.put_row(id, record);
        Ok(id)
    }

    fn remove_row(&mut self, id: i64) -> Option<StoredPhoto> {
        let record = self.rows.remove(&id)?;

        self.file_names.remove(&record.file_name);
        if let Some(ids) = self.expirations.get_mut(&record.expiration_date) {
            ids.remove(&id);
            if ids.is_empty() {
                self.expirations.remove(&record.expiration_date);
            }
        }

        Some(record)
    }
}

/// Non-durable photo table, mainly for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: OnceCell<RwLock<MemoryTable>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    async fn table(&self) -> &RwLock<MemoryTable> {
        self.table
            .get_or_init(|| async {
                debug!("Created in-memory photo table");
                RwLock::new(MemoryTable::default())
            })
            .await
    }
}

#[async_trait]
impl PhotoBackend for MemoryBackend {
    async fn open(&self) -> Result<()> {
        self.table().await;
        Ok(())
    }

    async fn get_by_file_name(&self, file_name: &str) -> Result<Option<StoredPhoto>> {
        let table = self.table().await.read().await;

        Ok(table
            .file_names
            .get(file_name)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn insert(&self, record: StoredPhoto) -> Result<i64> {
        self.table().await.write().await.insert_row(record)
    }

    async fn replace(&self, record: StoredPhoto) -> Result<i64> {
        let mut table = self.table().await.write().await;

        match table.file_names.get(&record.file_name).copied() {
            Some(id) => {
                table.remove_row(id);
                table.put_row(id, record);
                Ok(id)
            }
            None => table.insert_row(record),
        }
    }

    async fn delete_by_file_name(&self, file_name: &str) -> Result<bool> {
        let mut table = self.table().await.write().await;

        let Some(id) = table.file_names.get(file_name).copied() else {
            return Ok(false);
        };
        Ok(table.remove_row(id).is_some())
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.table().await.write().await.remove_row(id).is_some())
    }

    async fn range_by_file_name(
        &self,
        lower: &str,
        upper: Option<&str>,
    ) -> Result<Vec<StoredPhoto>> {
        let table = self.table().await.read().await;

        let upper = match upper {
            Some(upper) if upper <= lower => return Ok(Vec::new()),
            Some(upper) => Bound::Excluded(upper),
            None => Bound::Unbounded,
        };

        Ok(table
            .file_names
            .range::<str, _>((Bound::Included(lower), upper))
            .filter_map(|(_, id)| table.rows.get(id).cloned())
            .collect())
    }

    async fn cursor_by_file_name(
        &self,
        after: Option<&str>,
        limit: u64,
    ) -> Result<Vec<StoredPhoto>> {
        let table = self.table().await.read().await;

        let lower = match after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };

        Ok(table
            .file_names
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit as usize)
            .filter_map(|(_, id)| table.rows.get(id).cloned())
            .collect())
    }

    async fn cursor_by_id(&self, after: Option<i64>, limit: u64) -> Result<Vec<StoredPhoto>> {
        let table = self.table().await.read().await;

        let lower = match after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };

        Ok(table
            .rows
            .range((lower, Bound::Unbounded))
            .take(limit as usize)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn range_by_expiration(&self, before: i64) -> Result<Vec<String>> {
        let table = self.table().await.read().await;

        Ok(table
            .expirations
            .range(..before)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| table.rows.get(id).map(|r| r.file_name.clone()))
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.table().await.read().await.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SyncOperation;

    fn stored(file_name: &str, expiration_date: i64) -> StoredPhoto {
        StoredPhoto {
            id: None,
            file_name: file_name.to_string(),
            mime: "image/jpeg".to_string(),
            payload: vec![1, 2, 3],
            is_on_s3: false,
            sync_operation: SyncOperation::Insert,
            is_stored_by_user: false,
            expiration_date,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let backend = MemoryBackend::new();

        let first = backend.insert(stored("a.jpg", 10)).await.unwrap();
        let second = backend.insert(stored("b.jpg", 10)).await.unwrap();
        assert!(second > first);

        let got = backend.get_by_file_name("a.jpg").await.unwrap().unwrap();
        assert_eq!(got.id, Some(first));
    }

    #[tokio::test]
    async fn test_duplicate_file_name_rejected() {
        let backend = MemoryBackend::new();
        backend.insert(stored("a.jpg", 10)).await.unwrap();

        let err = backend.insert(stored("a.jpg", 20)).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(backend.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_cleans_secondary_indexes() {
        let backend = MemoryBackend::new();
        backend.insert(stored("a.jpg", 10)).await.unwrap();
        backend.insert(stored("b.jpg", 10)).await.unwrap();

        assert!(backend.delete_by_file_name("a.jpg").await.unwrap());
        assert!(!backend.delete_by_file_name("a.jpg").await.unwrap());

        assert_eq!(backend.range_by_expiration(11).await.unwrap(), vec!["b.jpg"]);
        // The freed name can be reused
        backend.insert(stored("a.jpg", 30)).await.unwrap();
        assert_eq!(backend.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_keeps_primary_key_and_reindexes() {
        let backend = MemoryBackend::new();
        let id = backend.insert(stored("a.jpg", 10)).await.unwrap();

        let mut updated = stored("a.jpg", 50);
        updated.is_on_s3 = true;
        assert_eq!(backend.replace(updated).await.unwrap(), id);

        let got = backend.get_by_file_name("a.jpg").await.unwrap().unwrap();
        assert!(got.is_on_s3);
        assert!(backend.range_by_expiration(11).await.unwrap().is_empty());
        assert_eq!(backend.range_by_expiration(51).await.unwrap(), vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn test_cursors_resume_after_position() {
        let backend = MemoryBackend::new();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            backend.insert(stored(name, 0)).await.unwrap();
        }

        let page = backend.cursor_by_file_name(Some("a.jpg"), 10).await.unwrap();
        let names: Vec<_> = page.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.jpg", "c.jpg"]);

        let page = backend.cursor_by_id(Some(1), 1).await.unwrap();
        assert_eq!(page[0].file_name, "a.jpg");
    }
}
