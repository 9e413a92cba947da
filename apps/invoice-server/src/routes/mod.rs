//! Route modules for the invoice server

pub mod extract;
pub mod files;
pub mod health;
pub mod invoices;
pub mod pdf_convert;
pub mod upload;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
};

use crate::error::{AppError, Result};

/// Multipart field carrying the PDF on upload and convert requests
pub const PDF_FIELD: &str = "pdf";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Room for multipart boundaries and part headers on top of the file limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body limit for a route accepting files up to `max_file_bytes`
pub(crate) fn body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes + MULTIPART_OVERHEAD
}

/// A PDF file read from a multipart request
#[derive(Debug)]
pub(crate) struct PdfUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl PdfUpload {
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map_or(false, |ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
    }
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge { max: max_bytes };
    }
    tracing::warn!(error = %e, "Failed to read multipart body");
    AppError::Validation(format!("Failed to read upload: {}", e.body_text()))
}

/// Pull the `pdf` field out of a multipart body, ignoring other fields
pub(crate) async fn read_pdf_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<PdfUpload> {
    let mut multipart = multipart
        .map_err(|e| AppError::Validation(format!("Expected a multipart/form-data body: {}", e.body_text())))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(PDF_FIELD) {
            tracing::debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let file_name = field
            .file_name()
            .map(clean_file_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let content_type = field.content_type().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;

        if data.len() > max_bytes {
            return Err(AppError::PayloadTooLarge { max: max_bytes });
        }
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        tracing::debug!(
            file_name = %file_name,
            content_type = ?content_type,
            bytes = data.len(),
            "Received PDF upload"
        );

        return Ok(PdfUpload {
            file_name,
            content_type,
            data,
        });
    }

    Err(AppError::Validation(format!(
        "No PDF file uploaded (expected multipart field '{}')",
        PDF_FIELD
    )))
}

/// Last path component of a client-supplied name, without control characters
fn clean_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    base.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

/// File name safe to place inside a quoted header parameter
pub(crate) fn header_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
