//! Process-wide photo store
//!
//! The application shares one SQLite-backed store for its whole lifetime.
//! It is created on first access, opened exactly once even under concurrent
//! first use, and never closed.

use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::SqliteBackend;
use crate::error::{Result, StoreError};
use crate::photo_store::PhotoStore;
use crate::PhotoStoreConfig;

static INSTANCE: OnceCell<PhotoStore<SqliteBackend>> = OnceCell::const_new();

/// Create and open the shared store with `config`
///
/// Must run before the first [`get`]; afterwards it fails with
/// `AlreadyInitialized`.
pub async fn init(config: PhotoStoreConfig) -> Result<&'static PhotoStore<SqliteBackend>> {
    let path = config.db_path.clone();
    INSTANCE
        .set(PhotoStore::with_config(config))
        .map_err(|_| StoreError::AlreadyInitialized)?;

    info!("Shared photo store configured at {}", path.display());
    get().await
}

/// The shared store, created with the default config if [`init`] never ran
pub async fn get() -> Result<&'static PhotoStore<SqliteBackend>> {
    let store = INSTANCE
        .get_or_init(|| async { PhotoStore::with_config(PhotoStoreConfig::default()) })
        .await;

    store.open().await?;
    Ok(store)
}
