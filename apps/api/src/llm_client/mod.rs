//! LLM Client — the single point of entry for all model calls in the matcher.
//!
//! Every backend implements [`ModelProvider`]. Callers only ever see
//! [`ModelProvider::generate`], which normalizes transport failures, API errors
//! and malformed JSON into an empty [`StructuredResult`] after logging them.
//!
//! Backends are picked once at startup by [`create_provider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod google;
pub mod ollama;
pub mod openai;
pub mod prompts;

use google::GoogleProvider;
use ollama::OllamaProvider;
use openai::OpenAiProvider;

/// Hosted APIs get the same client timeout as the rest of the service.
const HOSTED_TIMEOUT: Duration = Duration::from_secs(120);
/// Self-hosted models on CPU can take minutes for a multi-job prompt.
const LOCAL_TIMEOUT: Duration = Duration::from_secs(600);

/// Parsed model output. An empty map means "no information".
pub type StructuredResult = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM returned JSON that is not an object")]
    NotAnObject,
}

/// Startup-fatal provider configuration problems.
#[derive(Debug, Error)]
pub enum ProviderConfigError {
    #[error("Unsupported LLM provider '{0}' (expected google, openai or ollama)")]
    Unsupported(String),

    #[error("{variable} is required when LLM_PROVIDER={provider}")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Provider selection plus the credentials each backend may need.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub provider: String,
    pub model: String,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_host: String,
    /// Fixed pause before every Google call.
    pub request_delay: Duration,
    pub max_retries: u32,
}

/// A model backend that turns one prompt into one JSON object.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider label used in logs ("google", "openai", "ollama").
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Calls the backend and parses its answer, surfacing every failure.
    async fn try_generate(&self, prompt: &str) -> Result<StructuredResult, LlmError>;

    /// Calls the backend; any failure is logged and returned as an empty map.
    async fn generate(&self, prompt: &str) -> StructuredResult {
        match self.try_generate(prompt).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    provider = self.name(),
                    model = self.model(),
                    error = %e,
                    "Model call failed, treating as empty result"
                );
                StructuredResult::new()
            }
        }
    }
}

/// Builds the configured provider. Unknown names and missing credentials are
/// configuration errors, never per-call failures.
pub fn create_provider(
    settings: &ProviderSettings,
) -> Result<Arc<dyn ModelProvider>, ProviderConfigError> {
    let model = settings.model.clone();
    match settings.provider.trim().to_lowercase().as_str() {
        "google" => {
            let api_key = settings.google_api_key.clone().ok_or(
                ProviderConfigError::MissingCredential {
                    provider: "google",
                    variable: "GOOGLE_API_KEY",
                },
            )?;
            let transport = HttpTransport::new(HOSTED_TIMEOUT, settings.max_retries)?;
            Ok(Arc::new(GoogleProvider::new(
                transport,
                google::API_BASE_URL.to_string(),
                model,
                api_key,
                settings.request_delay,
            )))
        }
        "openai" => {
            let api_key = settings.openai_api_key.clone().ok_or(
                ProviderConfigError::MissingCredential {
                    provider: "openai",
                    variable: "OPENAI_API_KEY",
                },
            )?;
            let transport = HttpTransport::new(HOSTED_TIMEOUT, settings.max_retries)?;
            Ok(Arc::new(OpenAiProvider::new(
                transport,
                openai::API_BASE_URL.to_string(),
                model,
                api_key,
            )))
        }
        "ollama" => {
            let transport = HttpTransport::new(LOCAL_TIMEOUT, settings.max_retries)?;
            Ok(Arc::new(OllamaProvider::new(
                transport,
                settings.ollama_host.clone(),
                model,
            )))
        }
        other => Err(ProviderConfigError::Unsupported(other.to_string())),
    }
}

/// HTTP plumbing shared by all backends.
/// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            max_retries: max_retries.max(1),
        })
    }

    pub async fn post_json<B, T>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T, LlmError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(6)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(url).json(body);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(&body).unwrap_or(body),
                });
            }

            debug!("LLM call succeeded with status {}", status);
            return Ok(response.json::<T>().await?);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Pulls a readable message out of `{"error": {"message": ..}}` or `{"error": ".."}`.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(String::from)
}

/// Parses a free-text model answer as a JSON object. Tries, in order: the
/// text as-is, the text with one wrapping fence removed, and the body of the
/// first fenced block inside surrounding prose.
pub fn parse_fenced_object(text: &str) -> Result<StructuredResult, LlmError> {
    if let Ok(map) = parse_object(text) {
        return Ok(map);
    }
    if let Ok(map) = parse_object(strip_json_fences(text)) {
        return Ok(map);
    }
    parse_object(extract_fenced_json(text))
}

/// Strips a leading ```json or ``` and a trailing ``` from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Body of the first fenced block, with or without a `json` tag. Text
/// without fences comes back trimmed.
fn extract_fenced_json(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest.split_once("```").map_or(rest, |(inner, _)| inner)
    } else if let Some((_, rest)) = text.split_once("```") {
        rest.split_once("```").map_or(rest, |(inner, _)| inner)
    } else {
        text
    };
    body.trim()
}

/// Parses model text as a JSON object.
pub fn parse_object(text: &str) -> Result<StructuredResult, LlmError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(LlmError::NotAnObject),
    }
}
