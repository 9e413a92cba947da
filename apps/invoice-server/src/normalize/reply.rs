//! Model reply parsing
//!
//! Models are asked for bare JSON but often wrap it in a code fence or add a
//! sentence of prose. The reply is cleaned, parsed, then checked against the
//! invoice schema before anyone sees it.

use serde_json::Value;

use crate::invoice::{validate, ExtractedInvoice};

use super::types::NormalizeError;

/// Remove a leading fence (with optional language tag) and a trailing fence
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Greedy `{...}` span: first opening brace to last closing brace
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse a raw reply into JSON, tolerating fences and surrounding prose
pub fn parse_reply(raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = strip_code_fence(raw);

    match serde_json::from_str(cleaned) {
        Ok(value) => Ok(value),
        Err(direct) => {
            let span = object_span(cleaned).ok_or_else(|| {
                NormalizeError::MalformedModelResponse(format!(
                    "no JSON object found in model reply ({})",
                    direct
                ))
            })?;
            serde_json::from_str(span).map_err(|e| {
                NormalizeError::MalformedModelResponse(format!("invalid JSON in model reply: {}", e))
            })
        }
    }
}

/// Parse and schema-check a raw reply
pub fn invoice_from_reply(raw: &str) -> Result<ExtractedInvoice, NormalizeError> {
    let value = parse_reply(raw)?;
    validate::extracted_from_value(value).map_err(|violation| {
        NormalizeError::MalformedModelResponse(format!(
            "reply does not match the invoice schema: {}",
            violation
        ))
    })
}
