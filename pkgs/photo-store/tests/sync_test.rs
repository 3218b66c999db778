// Copyright 2024 Photo Store Team.
//
// Comprehensive tests for sync intent tracking

use photo_store::{PhotoBlob, PhotoRecord, PhotoStore, SyncOperation};
use tempfile::NamedTempFile;

fn create_test_store(path: &NamedTempFile) -> PhotoStore {
    PhotoStore::new(path.path().to_path_buf())
}

async fn seed(store: &PhotoStore, entries: &[(&str, SyncOperation)]) {
    for (name, op) in entries {
        let record = PhotoRecord::new(*name, PhotoBlob::from_bytes(vec![1u8], "image/jpeg"), 0)
            .with_sync_state(false, *op);
        store.insert(&record).await.expect("Failed to seed photo");
    }
}

#[tokio::test]
async fn test_new_records_default_to_insert() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file);

    let record = PhotoRecord::new("site/a.jpg", PhotoBlob::from_bytes(vec![1u8], "image/jpeg"), 0);
    store.insert(&record).await.unwrap();

    let stored = store.get_by_file_name("site/a.jpg").await.unwrap().unwrap();
    assert_eq!(stored.sync_operation, SyncOperation::Insert);
    assert!(!stored.is_on_s3);
    assert!(!stored.is_stored_by_user);
}

#[tokio::test]
async fn test_pending_and_summary() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file);
    seed(
        &store,
        &[
            ("site/c.jpg", SyncOperation::Delete),
            ("site/a.jpg", SyncOperation::Insert),
            ("site/b.jpg", SyncOperation::Stay),
            ("site/d.jpg", SyncOperation::Insert),
        ],
    )
    .await;

    let pending: Vec<_> = store
        .sync()
        .pending(SyncOperation::Insert)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.file_name)
        .collect();
    assert_eq!(pending, vec!["site/a.jpg", "site/d.jpg"]);

    let summary = store.sync().summary().await.unwrap();
    assert_eq!(summary[&SyncOperation::Insert], 2);
    assert_eq!(summary[&SyncOperation::Delete], 1);
    assert_eq!(summary[&SyncOperation::Stay], 1);
}

#[tokio::test]
async fn test_record_outcome_moves_record_between_queues() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file);
    seed(&store, &[("site/a.jpg", SyncOperation::Insert)]).await;

    let updated = store
        .sync()
        .record_outcome("site/a.jpg", true, SyncOperation::Stay)
        .await
        .unwrap();
    assert!(updated);

    assert!(store.sync().pending(SyncOperation::Insert).await.unwrap().is_empty());
    let stay = store.sync().pending(SyncOperation::Stay).await.unwrap();
    assert_eq!(stay.len(), 1);
    assert!(stay[0].is_on_s3);

    // Row count unchanged by the write-back
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_outcome_for_missing_photo() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file);

    let updated = store
        .sync()
        .record_outcome("site/missing.jpg", true, SyncOperation::Stay)
        .await
        .unwrap();
    assert!(!updated);
    assert_eq!(store.count().await.unwrap(), 0);
}
