//! Invoice normalization
//!
//! Sends extracted PDF text to a language model with a fixed instruction
//! template and turns the reply into a validated [`ExtractedInvoice`].
//!
//! [`ExtractedInvoice`]: crate::invoice::ExtractedInvoice

mod prompt;
mod provider;
mod reply;
mod service;
mod types;

pub use prompt::{build_prompt, MAX_PROMPT_TEXT_CHARS};
pub use provider::{GeminiModel, LanguageModel};
pub use reply::{invoice_from_reply, parse_reply, strip_code_fence};
pub use service::Normalizer;
pub use types::NormalizeError;

#[cfg(test)]
pub(crate) use provider::MockModel;
