//! Error types for the invoice server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::pdf::PdfError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File too large (max: {max} bytes)")]
    PayloadTooLarge { max: usize },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Machine-readable error kind and HTTP status
    pub fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Pdf(e) => match e {
                PdfError::EmptyText => (StatusCode::UNPROCESSABLE_ENTITY, "empty_text"),
                PdfError::UnreadablePdf(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unreadable_pdf"),
                PdfError::Write(_) | PdfError::Worker(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
            AppError::Normalize(e) => match e {
                NormalizeError::MissingApiKey => (StatusCode::SERVICE_UNAVAILABLE, "missing_api_key"),
                NormalizeError::MalformedModelResponse(_) => {
                    (StatusCode::BAD_GATEWAY, "malformed_model_response")
                }
                NormalizeError::Model(_) => (StatusCode::BAD_GATEWAY, "model_error"),
            },
            AppError::Storage(StorageError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.kind();

        // Server-side failures keep their internals out of the message
        let message = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Storage(StorageError::NotFound(id)) => format!("File not found: {}", id),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                "Storage error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                "Failed to encode stored record".to_string()
            }
            AppError::Pdf(e @ (PdfError::Write(_) | PdfError::Worker(_))) => {
                tracing::error!("PDF processing failed: {}", e);
                "An internal error occurred".to_string()
            }
            AppError::Normalize(e @ NormalizeError::Model(_)) => {
                tracing::warn!("Language model call failed: {}", e);
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_kinds() {
        let (status, kind) = AppError::from(PdfError::EmptyText).kind();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(kind, "empty_text");

        let (_, kind) = AppError::from(PdfError::UnreadablePdf("bad xref".into())).kind();
        assert_eq!(kind, "unreadable_pdf");

        let (status, kind) = AppError::from(PdfError::Write("disk".into())).kind();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "internal_error");
    }

    #[test]
    fn test_normalize_kinds() {
        let (status, kind) = AppError::from(NormalizeError::MissingApiKey).kind();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(kind, "missing_api_key");

        let (status, kind) =
            AppError::from(NormalizeError::MalformedModelResponse("no JSON".into())).kind();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(kind, "malformed_model_response");
    }

    #[test]
    fn test_blob_not_found_maps_to_404() {
        let (status, kind) = AppError::from(StorageError::NotFound("abc".into())).kind();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(kind, "not_found");
    }
}
