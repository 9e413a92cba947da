//! File serving routes
//!
//! Serves uploaded PDFs back to the viewer.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use super::header_file_name;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::is_valid_blob_id;

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new().route("/:file_id", get(serve_file))
}

/// GET /api/files/:file_id
async fn serve_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response> {
    if !is_valid_blob_id(&file_id) {
        return Err(AppError::Validation(format!("Invalid file ID: {}", file_id)));
    }

    let blob = state.blobs().get(&file_id).await?;
    let metadata = blob.metadata;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, metadata.content_type)
        .header(header::CONTENT_LENGTH, blob.data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", header_file_name(&metadata.file_name)),
        )
        // Blobs are immutable once stored
        .header(header::CACHE_CONTROL, "private, max-age=86400, immutable")
        .header(header::ETAG, format!("\"{}\"", metadata.sha256))
        .body(Body::from(blob.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
