//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::pipeline::ExtractionPipeline;
use crate::storage::BlobStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    blobs: Arc<dyn BlobStore>,
    db: SqlitePool,
    pipeline: ExtractionPipeline,
}

impl AppState {
    /// Create a new application state
    ///
    /// The pipeline must read from the same blob store the upload route writes to.
    pub fn new(
        config: Config,
        blobs: Arc<dyn BlobStore>,
        db: SqlitePool,
        pipeline: ExtractionPipeline,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                blobs,
                db,
                pipeline,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the blob store
    pub fn blobs(&self) -> &dyn BlobStore {
        self.inner.blobs.as_ref()
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the extraction pipeline
    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.inner.pipeline
    }
}
