//! Extraction pipeline
//!
//! One `/extract` request: read the stored PDF, pull its text, ask the model
//! for a structured record.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::invoice::{InvoiceData, Vendor};
use crate::normalize::Normalizer;
use crate::pdf::{self, PdfError, TextExtractor};
use crate::storage::BlobStore;

/// Canned invoice text used when sample fallback is enabled and a PDF cannot be decoded
pub const SAMPLE_INVOICE_TEXT: &str = "\
INVOICE

Vendor: Sample Company Inc
Address: 123 Test Street, Test City, TC 12345
Tax ID: TEST123456789

Invoice Number: INV-2024-001
Invoice Date: 2024-03-15
Currency: USD

Description                    Qty    Unit Price    Total
Sample Service                  1      $1000.00     $1000.00

Subtotal:                                          $1000.00
Tax (10%):                                         $100.00
Total:                                             $1100.00
";

/// Notice attached to responses built from the canned sample
pub const SAMPLE_NOTICE: &str =
    "PDF parsing failed, using sample data for testing. Please try a different PDF file.";

/// Result of one extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub vendor: Vendor,
    pub invoice: InvoiceData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Blob read, text extraction and normalization for a single file
#[derive(Clone)]
pub struct ExtractionPipeline {
    blobs: Arc<dyn BlobStore>,
    extractor: TextExtractor,
    normalizer: Normalizer,
    sample_fallback: bool,
}

impl ExtractionPipeline {
    pub fn new(blobs: Arc<dyn BlobStore>, extractor: TextExtractor, normalizer: Normalizer) -> Self {
        Self {
            blobs,
            extractor,
            normalizer,
            sample_fallback: false,
        }
    }

    /// Substitute the canned sample when both decode paths fail
    pub fn with_sample_fallback(mut self, enabled: bool) -> Self {
        self.sample_fallback = enabled;
        self
    }

    pub fn sample_fallback(&self) -> bool {
        self.sample_fallback
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Extract text from PDF bytes, applying the sample policy
    ///
    /// Returns the text and, when the sample was used, a notice for the caller.
    pub async fn extract_text(&self, bytes: Vec<u8>) -> Result<(String, Option<String>)> {
        let extractor = self.extractor;
        match pdf::run_blocking(move || extractor.extract(&bytes)).await {
            Ok(extracted) => {
                tracing::info!(
                    method = ?extracted.method,
                    chars = extracted.text.chars().count(),
                    truncated = extracted.truncated,
                    "Extracted text"
                );
                Ok((extracted.text, None))
            }
            Err(PdfError::UnreadablePdf(reason)) if self.sample_fallback => {
                tracing::warn!(reason = %reason, "PDF unreadable, substituting sample invoice text");
                Ok((SAMPLE_INVOICE_TEXT.to_string(), Some(SAMPLE_NOTICE.to_string())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run the full pipeline for a stored file
    pub async fn run(&self, file_id: &str) -> Result<ExtractResponse> {
        let blob = self.blobs.get(file_id).await?;
        tracing::info!(file_id = %file_id, bytes = blob.data.len(), "Loaded PDF for extraction");

        let (text, notice) = self.extract_text(blob.data).await?;
        let extracted = self.normalizer.normalize(&text).await?;

        Ok(ExtractResponse {
            vendor: extracted.vendor,
            invoice: extracted.invoice,
            notice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::normalize::{MockModel, NormalizeError};
    use crate::pdf::testing::{blank_pdf, sample_invoice_pdf};
    use crate::pdf::ExtractionLimits;
    use crate::storage::LocalBlobStore;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir, model: Option<Arc<MockModel>>) -> ExtractionPipeline {
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(dir.path()));
        let normalizer = match model {
            Some(model) => Normalizer::new(model),
            None => Normalizer::unconfigured(),
        };
        ExtractionPipeline::new(blobs, TextExtractor::new(ExtractionLimits::default()), normalizer)
    }

    async fn store(dir: &TempDir, data: &[u8]) -> String {
        LocalBlobStore::new(dir.path())
            .put(data, "invoice.pdf", "application/pdf")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_end_to_end_two_page_invoice() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(MockModel::invoice_reader());
        let pipeline = pipeline(&dir, Some(model.clone()));

        let (text, notice) = pipeline.extract_text(sample_invoice_pdf()).await.unwrap();
        assert!(text.contains("ACME Supplies Ltd"));
        assert!(text.contains("INV-2024-001"));
        assert!(notice.is_none());

        let file_id = store(&dir, &sample_invoice_pdf()).await;
        let response = pipeline.run(&file_id).await.unwrap();

        assert_eq!(response.vendor.name, "ACME Supplies Ltd");
        assert_eq!(response.invoice.number, "INV-2024-001");
        assert!(response.notice.is_none());
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Some(Arc::new(MockModel::invoice_reader())));

        let missing = uuid::Uuid::new_v4().simple().to_string();
        let err = pipeline.run(&missing).await.unwrap_err();
        assert_eq!(err.kind().1, "not_found");
    }

    #[tokio::test]
    async fn test_blank_pdf_is_empty_text() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Some(Arc::new(MockModel::invoice_reader())))
            .with_sample_fallback(true);

        let file_id = store(&dir, &blank_pdf(2)).await;
        let err = pipeline.run(&file_id).await.unwrap_err();
        assert!(matches!(err, AppError::Pdf(PdfError::EmptyText)));
    }

    #[tokio::test]
    async fn test_unreadable_without_fallback() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Some(Arc::new(MockModel::invoice_reader())));
        assert!(!pipeline.sample_fallback());

        let file_id = store(&dir, b"not a pdf at all").await;
        let err = pipeline.run(&file_id).await.unwrap_err();
        assert!(matches!(err, AppError::Pdf(PdfError::UnreadablePdf(_))));
    }

    #[tokio::test]
    async fn test_unreadable_with_sample_fallback() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(MockModel::invoice_reader());
        let pipeline = pipeline(&dir, Some(model.clone())).with_sample_fallback(true);

        let file_id = store(&dir, b"not a pdf at all").await;
        let response = pipeline.run(&file_id).await.unwrap();

        assert_eq!(response.vendor.name, "Sample Company Inc");
        assert_eq!(response.invoice.number, "INV-2024-001");
        assert_eq!(response.notice.as_deref(), Some(SAMPLE_NOTICE));
        assert!(model.prompts.lock().unwrap()[0].contains("Sample Service"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, None);

        let file_id = store(&dir, &sample_invoice_pdf()).await;
        let err = pipeline.run(&file_id).await.unwrap_err();
        assert!(matches!(err, AppError::Normalize(NormalizeError::MissingApiKey)));
    }

    #[test]
    fn test_notice_omitted_when_absent() {
        let response = ExtractResponse {
            vendor: Vendor {
                name: "Acme".into(),
                address: None,
                tax_id: None,
            },
            invoice: serde_json::from_value(serde_json::json!({
                "number": "A-1",
                "date": "2024-01-01"
            }))
            .unwrap(),
            notice: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("notice").is_none());
        assert_eq!(json["vendor"]["name"], "Acme");
    }
}
