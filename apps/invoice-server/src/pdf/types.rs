//! PDF data types

use serde::Serialize;

/// Page and character ceilings applied to every extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Only the first `max_pages` pages are decoded by the primary path
    pub max_pages: usize,
    /// Output is cut to this many characters
    pub max_chars: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_chars: 100_000,
        }
    }
}

/// Which decode path produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMethod {
    /// Page-bounded structural decode (lopdf)
    Primary,
    /// Whole-document decode with default settings (pdf-extract)
    Fallback,
}

/// Plain text pulled out of a PDF
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    /// Whether the character ceiling cut the text short
    pub truncated: bool,
}

/// PDF processing errors
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Could not extract any text from the provided PDF. The PDF may be image-only or corrupted.")]
    EmptyText,

    #[error("Unable to read this PDF file: {0}")]
    UnreadablePdf(String),

    #[error("Failed to write PDF: {0}")]
    Write(String),

    #[error("PDF worker failed: {0}")]
    Worker(String),
}
