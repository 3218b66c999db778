//! Photo Store - Durable local cache for field photos
//!
//! This crate keeps photos captured while offline in an indexed SQLite table
//! (through Sea-ORM) until an external sync client has reconciled them with a
//! remote object store.
//!
//! # Architecture
//!
//! - **Codec**: converts between [`PhotoBlob`] payloads and raw at-rest bytes
//! - **PhotoStore**: lazily opened table with a unique file-name index and a
//!   non-unique expiration index, generic over a [`PhotoBackend`]
//! - **Query**: prefix lookups, eager or as a lazy stream of batches
//! - **ThumbnailStore**: derives low-quality companions under a prefixed name
//! - **ExpirationReaper**: evicts records past their retention window
//! - **SyncTracker**: exposes the per-record sync intent to the sync client
//!
//! # Database Schema
//!
//! A single `photostate` table:
//!
//! - `id`: auto-increment primary key, never exposed to callers
//! - `file_name`: unique, the caller-facing key
//! - `expiration_date`: indexed, epoch milliseconds
//! - `payload`: raw image bytes
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photo_store::{PhotoBlob, PhotoRecord, PhotoStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PhotoStore::new("photos.db".into());
//!
//! let record = PhotoRecord::new(
//!     "site-12/roof/north.jpg",
//!     PhotoBlob::from_file("north.jpg", "image/jpeg"),
//!     chrono::Utc::now().timestamp_millis(),
//! );
//! store.thumbnails().insert_with_thumbnail(&record).await?;
//!
//! let roof = store.query_prefix("site-12/roof/").await?;
//! println!("{} photos of the roof", roof.len());
//!
//! let evicted = store.reaper().sweep_expired(chrono::Utc::now().timestamp_millis()).await?;
//! println!("evicted {evicted}");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod entities;
pub mod error;
pub mod expiration;
pub mod instance;
pub mod migration;
pub mod photo_store;
pub mod query;
pub mod sync_tracker;
pub mod thumbnail;
pub mod thumbnail_store;
pub mod types;

pub use backend::{MemoryBackend, PhotoBackend, SqliteBackend};
pub use codec::PhotoBlob;
pub use error::{CompressionError, StoreError};
pub use expiration::ExpirationReaper;
pub use photo_store::PhotoStore;
pub use query::{prefix_upper_bound, PrefixBatches};
pub use sync_tracker::SyncTracker;
pub use thumbnail::{compress, CompressOptions};
pub use thumbnail_store::{thumbnail_name, ThumbnailStore};
pub use types::{PhotoRecord, PhotoSummary, StoredPhoto, SyncOperation};

/// Prefix joining a thumbnail companion to its original's file name
pub const THUMBNAIL_PREFIX: &str = "thumbnail";

/// Thumbnail bounding box in pixels
pub const THUMBNAIL_WIDTH: u32 = 70;
pub const THUMBNAIL_HEIGHT: u32 = 70;

/// Encoder quality for thumbnails, in (0, 1]
pub const THUMBNAIL_QUALITY: f32 = 0.2;

/// Matches per batch yielded by the lazy prefix query
pub const LAZY_BATCH_SIZE: usize = 40;

/// Grace period added to `expiration_date` before a record may be evicted (one day)
pub const EXPIRATION_DELTA_MS: i64 = 86_400_000;

/// Configuration for the photo store
#[derive(Debug, Clone)]
pub struct PhotoStoreConfig {
    /// Path to the SQLite database file
    pub db_path: std::path::PathBuf,

    /// Rows fetched per cursor step during scans (default: 100)
    pub cursor_page_size: u64,

    /// Options for derived thumbnails (default: 70x70 at quality 0.2)
    pub thumbnail: CompressOptions,

    /// Options for `insert_compressed` (default: 1500x1500 at quality 0.9)
    pub compression: CompressOptions,
}

impl PhotoStoreConfig {
    /// Sea-ORM connection URL for `db_path`
    pub fn database_url(&self) -> String {
        backend::sqlite_url(&self.db_path)
    }
}

impl Default for PhotoStoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::path::PathBuf::from("photo-store.db"),
            cursor_page_size: 100,
            thumbnail: CompressOptions::thumbnail(),
            compression: CompressOptions::photo(),
        }
    }
}
