//! Google Generative Language backend (`generateContent`).
//!
//! The endpoint returns free text, often wrapped in Markdown fences, so the
//! answer goes through [`parse_fenced_object`]. A fixed delay
//! precedes every call to stay under free-tier rate limits. The delay does
//! not adapt to the quota actually left, so bursts can still hit 429s.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_fenced_object, HttpTransport, LlmError, ModelProvider, StructuredResult};

pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCandidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GoogleProvider {
    transport: HttpTransport,
    base_url: String,
    model: String,
    api_key: String,
    request_delay: Duration,
}

impl GoogleProvider {
    pub fn new(
        transport: HttpTransport,
        base_url: String,
        model: String,
        api_key: String,
        request_delay: Duration,
    ) -> Self {
        Self {
            transport,
            base_url,
            model,
            api_key,
            request_delay,
        }
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn try_generate(&self, prompt: &str) -> Result<StructuredResult, LlmError> {
        if !self.request_delay.is_zero() {
            debug!("Waiting {}ms before Google call", self.request_delay.as_millis());
            tokio::time::sleep(self.request_delay).await;
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response: GenerateContentResponse = self
            .transport
            .post_json(&url, &[("x-goog-api-key", self.api_key.as_str())], &body)
            .await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_fenced_object(&text)
    }
}
