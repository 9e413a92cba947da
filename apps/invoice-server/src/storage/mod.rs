//! Blob storage for uploaded PDFs
//!
//! Two backends: the local filesystem (default) and S3-compatible services
//! (MinIO, Cloudflare R2, Backblaze B2, AWS S3).

mod local;
mod s3_client;
mod types;

pub use local::LocalBlobStore;
pub use s3_client::S3BlobStore;
pub use types::*;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Compute the hex SHA-256 of a byte slice
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Generate a fresh blob id
pub fn new_blob_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Blob ids are generated by this module; anything else is rejected
/// before it reaches a path or an object key.
pub fn is_valid_blob_id(id: &str) -> bool {
    Uuid::try_parse(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"Hello, World!");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_hash(b"Hello, World!"));
    }

    #[test]
    fn test_blob_id_validation() {
        assert!(is_valid_blob_id(&new_blob_id()));
        assert!(!is_valid_blob_id("../../etc/passwd"));
        assert!(!is_valid_blob_id(""));
    }
}
