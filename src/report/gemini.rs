//! Upstream text generation (Gemini `generateContent`)
//!
//! Server side of the report boundary: the report endpoint hands one prompt
//! to a [`TextGenerator`] and forwards its answer or failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upstream generation errors
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success upstream status with its raw body
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("invalid upstream response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Unified trait for text-generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single-turn prompt
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, empty when absent
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Model name for logging
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.model, "Upstream generation failed");
            return Err(GeneratorError::Upstream {
                status: status.as_u16(),
                body: raw,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw)?;
        let text = parsed.first_text();
        tracing::debug!(model = %self.model, chars = text.chars().count(), "Upstream generation complete");
        Ok(text)
    }

    fn backend_name(&self) -> &'static str {
        "Gemini"
    }
}
