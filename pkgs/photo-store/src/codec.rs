//! Codec between in-memory photo records and their at-rest form
//!
//! Outside the store a payload is a [`PhotoBlob`]: bytes tagged with a MIME type,
//! possibly still backed by a file on disk. Inside the store it is a plain byte
//! buffer, since not every backend can keep a structured blob.

use bytes::Bytes;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::Result;
use crate::types::{PhotoRecord, StoredPhoto};

#[derive(Debug, Clone, PartialEq)]
enum BlobSource {
    Memory(Bytes),
    File(PathBuf),
}

/// Binary image payload with its MIME type
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoBlob {
    source: BlobSource,
    mime: String,
}

impl PhotoBlob {
    /// Wrap bytes already held in memory
    pub fn from_bytes(bytes: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            source: BlobSource::Memory(bytes.into()),
            mime: mime.into(),
        }
    }

    /// Reference a file whose contents are read when the blob is drained
    pub fn from_file(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            source: BlobSource::File(path.into()),
            mime: mime.into(),
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// In-memory bytes, if the blob is not file-backed
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.source {
            BlobSource::Memory(bytes) => Some(bytes),
            BlobSource::File(_) => None,
        }
    }

    /// Read the full contents of the blob
    pub async fn read_all(&self) -> Result<Bytes> {
        match &self.source {
            BlobSource::Memory(bytes) => Ok(bytes.clone()),
            BlobSource::File(path) => {
                let mut file = tokio::fs::File::open(path).await?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf).await?;
                debug!("Drained {} bytes from {}", buf.len(), path.display());
                Ok(Bytes::from(buf))
            }
        }
    }
}

/// Convert a record into its at-rest form, draining the payload completely
pub async fn encode(record: &PhotoRecord) -> Result<StoredPhoto> {
    let payload = record.payload.read_all().await?;

    Ok(StoredPhoto {
        id: None,
        file_name: record.file_name.clone(),
        mime: record.mime.clone(),
        payload: payload.to_vec(),
        is_on_s3: record.is_on_s3,
        sync_operation: record.sync_operation,
        is_stored_by_user: record.is_stored_by_user,
        expiration_date: record.expiration_date,
    })
}

/// Wrap a stored byte buffer back into a blob tagged with the record's MIME type
pub fn decode(stored: StoredPhoto) -> PhotoRecord {
    let payload = PhotoBlob::from_bytes(stored.payload, stored.mime.clone());

    PhotoRecord {
        file_name: stored.file_name,
        mime: stored.mime,
        payload,
        is_on_s3: stored.is_on_s3,
        sync_operation: stored.sync_operation,
        is_stored_by_user: stored.is_stored_by_user,
        expiration_date: stored.expiration_date,
    }
}
