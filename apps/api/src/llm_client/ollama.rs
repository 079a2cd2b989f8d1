//! Self-hosted Ollama chat backend.
//!
//! Local models ignore formatting instructions often enough that the reply may
//! or may not be fenced, so it always goes through [`parse_fenced_object`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_fenced_object, HttpTransport, LlmError, ModelProvider, StructuredResult};

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub message: Option<OllamaResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaResponseMessage {
    #[serde(default)]
    pub content: String,
}

pub struct OllamaProvider {
    transport: HttpTransport,
    host: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(transport: HttpTransport, host: String, model: String) -> Self {
        Self {
            transport,
            host,
            model,
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn try_generate(&self, prompt: &str) -> Result<StructuredResult, LlmError> {
        let url = format!("{}/api/chat", self.host.trim_end_matches('/'));
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response: OllamaChatResponse = self.transport.post_json(&url, &[], &body).await?;
        let content = response.message.ok_or(LlmError::EmptyContent)?.content;
        parse_fenced_object(&content)
    }
}
