//! Storage types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata recorded alongside every stored blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    /// Hex-encoded SHA-256 of the blob contents
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A stored blob with its data
#[derive(Debug)]
pub struct StoredBlob {
    pub metadata: BlobMetadata,
    pub data: Vec<u8>,
}

/// Blob storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("S3 SDK error: {0}")]
    SdkError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt blob metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Binary storage for uploaded PDFs, keyed by a generated id
///
/// Blobs are written once and never mutated.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the new blob id
    async fn put(&self, data: &[u8], file_name: &str, content_type: &str)
        -> Result<BlobMetadata, StorageError>;

    /// Fetch a blob by id
    async fn get(&self, id: &str) -> Result<StoredBlob, StorageError>;

    /// Fetch only the metadata of a blob
    async fn head(&self, id: &str) -> Result<BlobMetadata, StorageError>;

    /// Check whether a blob exists
    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        match self.head(id).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
