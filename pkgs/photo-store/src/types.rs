//! Photo record types shared by the store, its backends and callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::PhotoBlob;

/// What the sync client should do with a record on its next pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    /// Upload to the remote store
    Insert,
    /// Remove from the remote store
    Delete,
    /// Nothing to do remotely
    Stay,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Insert => "insert",
            SyncOperation::Delete => "delete",
            SyncOperation::Stay => "stay",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sync operation: {0}")]
pub struct UnknownSyncOperation(pub String);

impl FromStr for SyncOperation {
    type Err = UnknownSyncOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(SyncOperation::Insert),
            "delete" => Ok(SyncOperation::Delete),
            "stay" => Ok(SyncOperation::Stay),
            other => Err(UnknownSyncOperation(other.to_string())),
        }
    }
}

/// A photo as callers see it, with a directly usable payload
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Unique logical identity; also the join key to the thumbnail companion
    pub file_name: String,
    pub mime: String,
    pub payload: PhotoBlob,
    pub is_on_s3: bool,
    pub sync_operation: SyncOperation,
    pub is_stored_by_user: bool,
    /// Epoch milliseconds; eviction happens once this plus the expiration delta has passed
    pub expiration_date: i64,
}

impl PhotoRecord {
    /// New capture that still needs uploading
    pub fn new(file_name: impl Into<String>, payload: PhotoBlob, expiration_date: i64) -> Self {
        Self {
            file_name: file_name.into(),
            mime: payload.mime().to_string(),
            payload,
            is_on_s3: false,
            sync_operation: SyncOperation::Insert,
            is_stored_by_user: false,
            expiration_date,
        }
    }

    pub fn stored_by_user(mut self, value: bool) -> Self {
        self.is_stored_by_user = value;
        self
    }

    pub fn with_sync_state(mut self, is_on_s3: bool, sync_operation: SyncOperation) -> Self {
        self.is_on_s3 = is_on_s3;
        self.sync_operation = sync_operation;
        self
    }

    pub fn summary(&self) -> PhotoSummary {
        PhotoSummary {
            file_name: self.file_name.clone(),
            mime: self.mime.clone(),
            size_bytes: self.payload.as_bytes().map(|b| b.len() as u64),
            is_on_s3: self.is_on_s3,
            sync_operation: self.sync_operation,
            is_stored_by_user: self.is_stored_by_user,
            expiration_date: self.expiration_date,
        }
    }
}

/// Record metadata without the payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoSummary {
    pub file_name: String,
    pub mime: String,
    pub size_bytes: Option<u64>,
    pub is_on_s3: bool,
    pub sync_operation: SyncOperation,
    pub is_stored_by_user: bool,
    pub expiration_date: i64,
}

/// A photo in its at-rest form
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPhoto {
    /// Backend primary key; `None` until inserted
    pub id: Option<i64>,
    pub file_name: String,
    pub mime: String,
    pub payload: Vec<u8>,
    pub is_on_s3: bool,
    pub sync_operation: SyncOperation,
    pub is_stored_by_user: bool,
    pub expiration_date: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_operation_round_trips_through_str() {
        for op in [SyncOperation::Insert, SyncOperation::Delete, SyncOperation::Stay] {
            assert_eq!(op.as_str().parse::<SyncOperation>().unwrap(), op);
        }
        assert_eq!(
            "upload".parse::<SyncOperation>(),
            Err(UnknownSyncOperation("upload".to_string()))
        );
    }

    #[test]
    fn test_sync_operation_serializes_lowercase() {
        let json = serde_json::to_string(&SyncOperation::Delete).unwrap();
        assert_eq!(json, "\"delete\"");
    }

    #[test]
    fn test_new_record_defaults() {
        let record = PhotoRecord::new(
            "site/a.jpg",
            PhotoBlob::from_bytes(vec![1u8, 2, 3], "image/jpeg"),
            42,
        );

        assert_eq!(record.mime, "image/jpeg");
        assert!(!record.is_on_s3);
        assert!(!record.is_stored_by_user);
        assert_eq!(record.sync_operation, SyncOperation::Insert);

        let summary = record.summary();
        assert_eq!(summary.size_bytes, Some(3));
        assert_eq!(summary.expiration_date, 42);
    }
}
