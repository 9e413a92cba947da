//! Normalization service
//!
//! Turns raw PDF text into a validated invoice record through a language model.

use std::sync::Arc;

use super::{
    prompt::build_prompt,
    provider::LanguageModel,
    reply::invoice_from_reply,
    types::NormalizeError,
};
use crate::invoice::ExtractedInvoice;

/// Normalizer over an optional model; without one every call reports a missing key
#[derive(Clone, Default)]
pub struct Normalizer {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Normalizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Normalizer that fails every request with `MissingApiKey`
    pub fn unconfigured() -> Self {
        Self { model: None }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Ask the model for a structured record and validate the reply
    pub async fn normalize(&self, text: &str) -> Result<ExtractedInvoice, NormalizeError> {
        let model = self.model.as_ref().ok_or(NormalizeError::MissingApiKey)?;

        let prompt = build_prompt(text);
        tracing::debug!(model = model.name(), prompt_chars = prompt.len(), "Sending extraction prompt");

        let raw = model.generate(&prompt).await?;
        tracing::debug!(model = model.name(), reply_chars = raw.len(), "Received model reply");

        let invoice = invoice_from_reply(&raw).map_err(|e| {
            tracing::warn!(model = model.name(), error = %e, "Model reply rejected");
            e
        })?;

        tracing::info!(
            vendor = %invoice.vendor.name,
            invoice_number = %invoice.invoice.number,
            line_items = invoice.invoice.line_items.len(),
            "Normalized invoice"
        );

        Ok(invoice)
    }
}
