//! PDF conversion routes
//!
//! Endpoints:
//! - POST /api/pdf-convert/convert - Repackage a PDF viewers fail to open
//! - GET /api/pdf-convert/health - Service status

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{body_limit, header_file_name, read_pdf_field, PDF_CONTENT_TYPE};
use crate::error::{AppError, Result};
use crate::pdf;
use crate::state::AppState;

/// Largest accepted input
pub const MAX_CONVERT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ConvertHealth {
    pub status: &'static str,
}

/// Create the PDF conversion router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/convert", post(convert_pdf))
        .route("/health", get(convert_health))
        .layer(DefaultBodyLimit::max(body_limit(MAX_CONVERT_BYTES)))
}

/// POST /api/pdf-convert/convert
async fn convert_pdf(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Response> {
    let upload = read_pdf_field(multipart, MAX_CONVERT_BYTES).await?;
    let file_name = upload.file_name;
    let data = upload.data;
    let input_bytes = data.len();

    let output = pdf::run_blocking(move || pdf::repackage(&data)).await?;

    tracing::info!(
        file_name = %file_name,
        input_bytes,
        output_bytes = output.len(),
        "Converted PDF"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, output.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"converted_{}\"", header_file_name(&file_name)),
        )
        .body(Body::from(output))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /api/pdf-convert/health
async fn convert_health() -> Json<ConvertHealth> {
    Json(ConvertHealth {
        status: "PDF conversion service is running",
    })
}
