//! PDF processing module
//!
//! Text extraction for AI normalization and structural repackaging, both on
//! pure-Rust PDF libraries (`lopdf`, `pdf-extract`).

mod repackage;
mod text;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use repackage::{page_count, repackage};
pub use text::{truncate_chars, TextExtractor};
pub use types::{ExtractedText, ExtractionLimits, ExtractionMethod, PdfError};

/// Run CPU-bound PDF work off the async runtime
pub async fn run_blocking<T, F>(work: F) -> Result<T, PdfError>
where
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PdfError::Worker(e.to_string()))?
}
