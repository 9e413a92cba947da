//! PDF text extraction
//!
//! Two decode paths. The primary path walks the page tree with `lopdf` and
//! stops after `max_pages`. If that throws, `pdf-extract` decodes the whole
//! document with its default settings. Both libraries can panic on malformed
//! input, so each call runs inside `catch_unwind`.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;

use super::types::{ExtractedText, ExtractionLimits, ExtractionMethod, PdfError};

/// Best-effort PDF to plain text conversion
#[derive(Debug, Clone, Copy)]
pub struct TextExtractor {
    limits: ExtractionLimits,
}

impl TextExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ExtractionLimits {
        self.limits
    }

    /// Extract text from PDF bytes
    ///
    /// An empty result from the primary path is final; only a decode failure
    /// moves on to the fallback.
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, PdfError> {
        let primary_error = match guarded(|| decode_primary(bytes, self.limits.max_pages)) {
            Ok(text) => return self.finish(text, ExtractionMethod::Primary),
            Err(e) => e,
        };

        tracing::warn!(error = %primary_error, "Primary PDF decode failed, trying fallback");

        match guarded(|| decode_fallback(bytes)) {
            Ok(text) => self.finish(text, ExtractionMethod::Fallback),
            Err(fallback_error) => {
                tracing::warn!(error = %fallback_error, "Fallback PDF decode also failed");
                Err(PdfError::UnreadablePdf(format!(
                    "{}; fallback: {}",
                    primary_error, fallback_error
                )))
            }
        }
    }

    fn finish(&self, text: String, method: ExtractionMethod) -> Result<ExtractedText, PdfError> {
        let (text, truncated) = truncate_chars(text, self.limits.max_chars);

        tracing::debug!(
            method = ?method,
            chars = text.chars().count(),
            truncated,
            "Extracted PDF text"
        );

        if text.trim().is_empty() {
            return Err(PdfError::EmptyText);
        }

        Ok(ExtractedText {
            text,
            method,
            truncated,
        })
    }
}

fn decode_primary(bytes: &[u8], max_pages: usize) -> Result<String, String> {
    let document = Document::load_mem(bytes).map_err(|e| format!("failed to load PDF: {}", e))?;

    // get_pages is keyed by page number, so this is document order
    let page_numbers: Vec<u32> = document
        .get_pages()
        .keys()
        .copied()
        .take(max_pages)
        .collect();

    if page_numbers.is_empty() {
        return Ok(String::new());
    }

    document
        .extract_text(&page_numbers)
        .map_err(|e| format!("failed to extract text: {}", e))
}

fn decode_fallback(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| format!("failed to extract text: {}", e))
}

fn guarded<F>(decode: F) -> Result<String, String>
where
    F: FnOnce() -> Result<String, String>,
{
    panic::catch_unwind(AssertUnwindSafe(decode))
        .unwrap_or_else(|_| Err("decoder panicked (malformed document)".to_string()))
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            text.truncate(byte_index);
            (text, true)
        }
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{blank_pdf, pdf_with_pages};

    fn extractor(max_pages: usize, max_chars: usize) -> TextExtractor {
        TextExtractor::new(ExtractionLimits {
            max_pages,
            max_chars,
        })
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello".to_string(), 10), ("hello".to_string(), false));
        assert_eq!(truncate_chars("hello".to_string(), 5), ("hello".to_string(), false));
        assert_eq!(truncate_chars("hello".to_string(), 3), ("hel".to_string(), true));
        // Multi-byte characters count once
        assert_eq!(truncate_chars("€€€€".to_string(), 2), ("€€".to_string(), true));
        assert_eq!(truncate_chars("abc".to_string(), 0), (String::new(), true));
    }

    #[test]
    fn test_extracts_invoice_text() {
        let pdf = pdf_with_pages(&[
            &["ACME Supplies Ltd", "Invoice Number: INV-2024-001"],
            &["Total: 1100.00"],
        ]);

        let extracted = extractor(5, 100_000).extract(&pdf).unwrap();
        assert_eq!(extracted.method, ExtractionMethod::Primary);
        assert!(!extracted.truncated);
        assert!(extracted.text.contains("ACME Supplies Ltd"));
        assert!(extracted.text.contains("INV-2024-001"));
        assert!(extracted.text.contains("1100.00"));
    }

    #[test]
    fn test_respects_page_limit() {
        let pdf = pdf_with_pages(&[&["PAGE-ONE"], &["PAGE-TWO"], &["PAGE-THREE"]]);

        let extracted = extractor(2, 100_000).extract(&pdf).unwrap();
        assert!(extracted.text.contains("PAGE-ONE"));
        assert!(extracted.text.contains("PAGE-TWO"));
        assert!(!extracted.text.contains("PAGE-THREE"));
    }

    #[test]
    fn test_respects_char_limit() {
        let pdf = pdf_with_pages(&[&["A fairly long line of invoice text for truncation"]]);

        let extracted = extractor(5, 10).extract(&pdf).unwrap();
        assert!(extracted.truncated);
        assert!(!extracted.text.trim().is_empty());
        assert!(extracted.text.chars().count() <= 10);
    }

    #[test]
    fn test_image_only_pdf_is_empty_text() {
        let result = extractor(5, 100_000).extract(&blank_pdf(2));
        assert!(matches!(result, Err(PdfError::EmptyText)));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let result = extractor(5, 100_000).extract(b"this is definitely not a PDF");
        assert!(matches!(result, Err(PdfError::UnreadablePdf(_))));
    }
}
