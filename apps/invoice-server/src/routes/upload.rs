//! Upload routes
//!
//! Endpoints:
//! - POST /api/upload - Store a PDF (multipart field `pdf`)

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use super::{body_limit, read_pdf_field, PDF_CONTENT_TYPE};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub file_name: String,
}

/// Create the upload router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_pdf))
        .layer(DefaultBodyLimit::max(body_limit(MAX_UPLOAD_BYTES)))
}

/// POST /api/upload
async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let upload = read_pdf_field(multipart, MAX_UPLOAD_BYTES).await?;

    if !upload.is_pdf() {
        return Err(AppError::UnsupportedMediaType(format!(
            "Only PDF files are allowed (got {})",
            upload.content_type.as_deref().unwrap_or("no content type")
        )));
    }

    let metadata = state
        .blobs()
        .put(&upload.data, &upload.file_name, PDF_CONTENT_TYPE)
        .await?;

    tracing::info!(
        file_id = %metadata.id,
        file_name = %metadata.file_name,
        size = metadata.size,
        "PDF uploaded"
    );

    Ok(Json(UploadResponse {
        file_id: metadata.id,
        file_name: metadata.file_name,
    }))
}
