//! Language model providers
//!
//! Defines the model trait and the Gemini REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::NormalizeError;
use crate::config::ModelConfig;

/// Text-in, text-out language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs
    fn name(&self) -> &str;

    /// Send a prompt and return the raw reply text
    async fn generate(&self, prompt: &str) -> Result<String, NormalizeError>;
}

/// Google Gemini `generateContent` client
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    /// Build a client from config; fails when no API key is set
    pub fn new(config: &ModelConfig) -> Result<Self, NormalizeError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(NormalizeError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NormalizeError::Model(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, NormalizeError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(NormalizeError::Model(format!("Gemini produced no reply: {}", reason)));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "empty content".to_string());
            return Err(NormalizeError::MalformedModelResponse(format!(
                "Gemini reply had no text ({})",
                reason
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, NormalizeError> {
        let request = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NormalizeError::Model(format!("Failed to call Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NormalizeError::Model(format!("Gemini returned {}: {}", status, body)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| NormalizeError::Model(format!("Failed to parse Gemini response: {}", e)))?;

        body.into_text()
    }
}

/// Scripted model for tests; records every prompt it receives
#[cfg(test)]
pub(crate) struct MockModel {
    respond: Box<dyn Fn(&str) -> Result<String, NormalizeError> + Send + Sync>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockModel {
    pub fn from_fn<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<String, NormalizeError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::from_fn(move |_| Ok(reply.clone()))
    }

    /// Read `Vendor:`, `Invoice Number:` and `Invoice Date:` lines out of
    /// the prompt and answer with a fenced JSON record built from them
    pub fn invoice_reader() -> Self {
        Self::from_fn(|prompt| {
            let field = |label: &str| {
                prompt
                    .lines()
                    .find_map(|line| line.trim().strip_prefix(label))
                    .map(|value| value.trim().to_string())
                    .unwrap_or_default()
            };
            let record = serde_json::json!({
                "vendor": { "name": field("Vendor:") },
                "invoice": {
                    "number": field("Invoice Number:"),
                    "date": field("Invoice Date:"),
                    "lineItems": []
                }
            });
            Ok(format!("```json\n{}\n```", record))
        })
    }
}

#[cfg(test)]
#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, NormalizeError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.respond)(prompt)
    }
}
