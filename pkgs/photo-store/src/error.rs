//! Error types for the photo store

use thiserror::Error;

/// Errors raised by the image compression step
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Failed to decode image payload: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode compressed image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Quality must be in (0, 1], got {0}")]
    InvalidQuality(f32),

    #[error("Bounds must be non-zero, got {width}x{height}")]
    InvalidBounds { width: u32, height: u32 },
}

/// Errors that can occur in photo store operations
///
/// A missing record is never an error: lookups return `None` and queries
/// return an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database could not be opened or migrated.
    #[error("Photo store unavailable at {url}: {source}")]
    StoreUnavailable {
        url: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// A record with the same file name already exists.
    #[error("File name already stored: {0}")]
    UniqueConstraintViolation(String),

    #[error("Compression failed: {0}")]
    Compression(#[from] CompressionError),

    /// The range-bound path needs at least one character to increment.
    #[error("Prefix must not be empty for a bounded range scan")]
    InvalidPrefix,

    /// The payload source could not be drained.
    #[error("Failed to read photo payload: {0}")]
    Payload(#[from] std::io::Error),

    /// The primary record was stored but its thumbnail companion was not.
    #[error("Thumbnail for {file_name} failed after primary insert: {source}")]
    Thumbnail {
        file_name: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Photo store already initialized")]
    AlreadyInitialized,
}

impl StoreError {
    /// Whether this error reports a duplicate file name
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueConstraintViolation(_))
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
