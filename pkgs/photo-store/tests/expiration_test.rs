// Copyright 2024 Photo Store Team.
//
// Comprehensive tests for expiration sweeps and bulk deletes

use photo_store::{PhotoBlob, PhotoRecord, PhotoStore, PhotoStoreConfig, EXPIRATION_DELTA_MS};
use tempfile::NamedTempFile;

fn create_test_store(path: &NamedTempFile, cursor_page_size: u64) -> PhotoStore {
    PhotoStore::with_config(PhotoStoreConfig {
        db_path: path.path().to_path_buf(),
        cursor_page_size,
        ..Default::default()
    })
}

fn create_test_record(file_name: &str, expiration_date: i64) -> PhotoRecord {
    PhotoRecord::new(
        file_name,
        PhotoBlob::from_bytes(vec![0xFFu8, 0xD8], "image/jpeg"),
        expiration_date,
    )
}

#[tokio::test]
async fn test_insert_query_sweep_scenario() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file, 100);
    let t = 1_700_000_000_000;

    store.insert(&create_test_record("site/a.jpg", t)).await.unwrap();

    let found = store.query_prefix("site/").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].file_name, "site/a.jpg");

    let deleted = store
        .reaper()
        .sweep_expired(t + EXPIRATION_DELTA_MS + 1)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(store.get_by_file_name("site/a.jpg").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sweep_respects_exact_threshold() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file, 100);
    let now = 1_700_000_000_000;

    // Expires exactly at the boundary: kept
    store
        .insert(&create_test_record("edge.jpg", now - EXPIRATION_DELTA_MS))
        .await
        .unwrap();
    // One millisecond past: evicted
    store
        .insert(&create_test_record("past.jpg", now - EXPIRATION_DELTA_MS - 1))
        .await
        .unwrap();
    // Already expired by its own date but still inside the grace day: kept
    store.insert(&create_test_record("grace.jpg", now - 1)).await.unwrap();

    assert_eq!(store.reaper().sweep_expired(now).await.unwrap(), 1);
    assert!(store.get_by_file_name("past.jpg").await.unwrap().is_none());
    assert!(store.get_by_file_name("edge.jpg").await.unwrap().is_some());
    assert!(store.get_by_file_name("grace.jpg").await.unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_spans_cursor_pages_and_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file, 7);
    let now = 50 * EXPIRATION_DELTA_MS;

    for i in 0..60 {
        let expiration = if i % 3 == 0 { 0 } else { now };
        store
            .insert(&create_test_record(&format!("site/{i:02}.jpg"), expiration))
            .await
            .unwrap();
    }

    let mut preview = store.reaper().expired_file_names(now).await.unwrap();
    preview.sort();
    assert_eq!(preview.len(), 20);

    assert_eq!(store.reaper().sweep_expired(now).await.unwrap(), 20);
    assert_eq!(store.count().await.unwrap(), 40);
    for name in &preview {
        assert!(store.get_by_file_name(name).await.unwrap().is_none());
    }

    assert_eq!(store.reaper().sweep_expired(now).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 40);
}

#[tokio::test]
async fn test_sweep_on_empty_store() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file, 100);

    assert_eq!(store.reaper().sweep_expired_now().await.unwrap(), 0);
}

#[tokio::test]
async fn test_bulk_delete_by_prefix() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = create_test_store(&temp_file, 100);

    for name in ["site-1/a.jpg", "site-1/b.jpg", "site-10/a.jpg", "site-2/a.jpg"] {
        store.insert(&create_test_record(name, 0)).await.unwrap();
    }

    let deleted = store.reaper().bulk_delete_by_prefix("site-1/").await.unwrap();
    assert_eq!(deleted, 2);

    let remaining: Vec<_> = store
        .query_prefix("")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.file_name)
        .collect();
    assert_eq!(remaining, vec!["site-10/a.jpg", "site-2/a.jpg"]);
}
