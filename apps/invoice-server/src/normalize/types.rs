//! Normalization types

/// Errors from turning extracted text into an invoice record
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Language model API key not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("Failed to parse AI response: {0}")]
    MalformedModelResponse(String),

    #[error("Language model request failed: {0}")]
    Model(String),
}
