//! S3-compatible blob storage
//!
//! Wraps the AWS SDK. Blob bytes live at `pdfs/<id>`; file name, checksum and
//! upload time travel as object metadata.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::SdkError,
    operation::{get_object::GetObjectError, head_object::HeadObjectError},
    primitives::ByteStream,
    Client,
};
use chrono::{DateTime, Utc};

use crate::config::S3Config;

use super::types::{BlobMetadata, BlobStore, StorageError, StoredBlob};
use super::{compute_hash, is_valid_blob_id, new_blob_id};

const KEY_PREFIX: &str = "pdfs";

/// S3-compatible blob store
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 client from configuration
    pub async fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "invoice-server",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        // Test connection by checking if bucket exists
        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Self { client, bucket }
    }

    fn key(id: &str) -> String {
        format!("{}/{}", KEY_PREFIX, id)
    }
}

fn object_missing<R>(e: &SdkError<GetObjectError, R>) -> bool {
    e.as_service_error().map_or(false, GetObjectError::is_no_such_key)
}

// HEAD responses carry no body, so a missing key surfaces as a bare NotFound
fn head_missing<R>(e: &SdkError<HeadObjectError, R>) -> bool {
    e.as_service_error().map_or(false, HeadObjectError::is_not_found)
}

fn metadata_from_parts(
    id: &str,
    size: Option<i64>,
    content_type: Option<&str>,
    last_modified: Option<&aws_sdk_s3::primitives::DateTime>,
    user_metadata: Option<&std::collections::HashMap<String, String>>,
) -> BlobMetadata {
    let get = |key: &str| user_metadata.and_then(|m| m.get(key)).cloned();

    let uploaded_at = get("uploaded-at")
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            last_modified.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        })
        .unwrap_or_else(Utc::now);

    BlobMetadata {
        id: id.to_string(),
        file_name: get("file-name")
            .map(|name| {
                urlencoding::decode(&name)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or(name)
            })
            .unwrap_or_else(|| format!("{}.pdf", id)),
        content_type: content_type.unwrap_or("application/pdf").to_string(),
        size: size.unwrap_or(0).max(0) as u64,
        sha256: get("sha256").unwrap_or_default(),
        uploaded_at,
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<BlobMetadata, StorageError> {
        let metadata = BlobMetadata {
            id: new_blob_id(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
            sha256: compute_hash(data),
            uploaded_at: Utc::now(),
        };

        let key = Self::key(&metadata.id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            // Metadata travels as HTTP headers, which only carry ASCII
            .metadata("file-name", urlencoding::encode(file_name))
            .metadata("sha256", &metadata.sha256)
            .metadata("uploaded-at", metadata.uploaded_at.to_rfc3339())
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to put object {}: {}", key, e)))?;

        tracing::debug!(
            blob_id = %metadata.id,
            bucket = %self.bucket,
            size = metadata.size,
            "Stored blob in S3"
        );

        Ok(metadata)
    }

    async fn get(&self, id: &str) -> Result<StoredBlob, StorageError> {
        if !is_valid_blob_id(id) {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let key = Self::key(id);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if object_missing(&e) {
                    StorageError::NotFound(id.to_string())
                } else {
                    StorageError::SdkError(format!("Failed to get object {}: {}", key, e))
                }
            })?;

        let metadata = metadata_from_parts(
            id,
            response.content_length(),
            response.content_type(),
            response.last_modified(),
            response.metadata(),
        );

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(StoredBlob { metadata, data })
    }

    async fn head(&self, id: &str) -> Result<BlobMetadata, StorageError> {
        if !is_valid_blob_id(id) {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let key = Self::key(id);
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if head_missing(&e) {
                    StorageError::NotFound(id.to_string())
                } else {
                    StorageError::SdkError(format!("Failed to head object {}: {}", key, e))
                }
            })?;

        Ok(metadata_from_parts(
            id,
            response.content_length(),
            response.content_type(),
            response.last_modified(),
            response.metadata(),
        ))
    }
}
