//! Extraction routes
//!
//! Endpoints:
//! - POST /api/extract - Pull structured invoice fields out of an uploaded PDF

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::pipeline::ExtractResponse;
use crate::state::AppState;
use crate::storage::is_valid_blob_id;

/// Extraction request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default)]
    pub file_id: String,
}

/// Create the extract router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(extract_invoice))
}

/// POST /api/extract
async fn extract_invoice(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let file_id = request.file_id.trim();
    if file_id.is_empty() {
        return Err(AppError::Validation("File ID is required".to_string()));
    }
    if !is_valid_blob_id(file_id) {
        return Err(AppError::Validation(format!("Invalid file ID: {}", file_id)));
    }

    let response = state.pipeline().run(file_id).await?;

    Ok(Json(response))
}
