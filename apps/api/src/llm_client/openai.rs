//! OpenAI chat-completions backend in JSON response mode.
//!
//! JSON mode guarantees the message content is a bare JSON document, so it is
//! parsed directly without fence stripping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompts::JSON_ONLY_SYSTEM;
use super::{parse_object, HttpTransport, LlmError, ModelProvider, StructuredResult};

pub const API_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

pub struct OpenAiProvider {
    transport: HttpTransport,
    base_url: String,
    model: String,
    authorization: String,
}

impl OpenAiProvider {
    pub fn new(transport: HttpTransport, base_url: String, model: String, api_key: String) -> Self {
        Self {
            transport,
            base_url,
            model,
            authorization: format!("Bearer {api_key}"),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn try_generate(&self, prompt: &str) -> Result<StructuredResult, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JSON_ONLY_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response: ChatCompletionResponse = self
            .transport
            .post_json(
                &url,
                &[("Authorization", self.authorization.as_str())],
                &body,
            )
            .await?;

        parse_object(response.content().ok_or(LlmError::EmptyContent)?)
    }
}
