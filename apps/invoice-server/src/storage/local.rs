//! Local filesystem blob storage
//!
//! Layout: `<root>/<id>.pdf` holds the bytes, `<id>.json` the metadata.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::types::{BlobMetadata, BlobStore, StorageError, StoredBlob};
use super::{compute_hash, is_valid_blob_id, new_blob_id};

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.pdf", id))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<BlobMetadata, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let metadata = BlobMetadata {
            id: new_blob_id(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
            sha256: compute_hash(data),
            uploaded_at: Utc::now(),
        };

        tokio::fs::write(self.data_path(&metadata.id), data).await?;
        // Metadata last: a blob without a sidecar is never visible
        tokio::fs::write(self.meta_path(&metadata.id), serde_json::to_vec(&metadata)?).await?;

        tracing::debug!(
            blob_id = %metadata.id,
            file_name = %metadata.file_name,
            size = metadata.size,
            "Stored blob on local filesystem"
        );

        Ok(metadata)
    }

    async fn get(&self, id: &str) -> Result<StoredBlob, StorageError> {
        let metadata = self.head(id).await?;
        let data = match tokio::fs::read(self.data_path(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(StoredBlob { metadata, data })
    }

    async fn head(&self, id: &str) -> Result<BlobMetadata, StorageError> {
        if !is_valid_blob_id(id) {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let raw = match tokio::fs::read(self.meta_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path());

        let data = b"%PDF-1.4 fake";
        let meta = store.put(data, "invoice.pdf", "application/pdf").await.unwrap();

        assert_eq!(meta.file_name, "invoice.pdf");
        assert_eq!(meta.size, data.len() as u64);
        assert_eq!(meta.sha256, compute_hash(data));

        let blob = store.get(&meta.id).await.unwrap();
        assert_eq!(blob.data, data);
        assert_eq!(blob.metadata, meta);
        assert!(store.exists(&meta.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path());

        let result = store.get(&new_blob_id()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!store.exists("not-a-uuid").await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path());

        let a = store.put(b"same", "a.pdf", "application/pdf").await.unwrap();
        let b = store.put(b"same", "a.pdf", "application/pdf").await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
