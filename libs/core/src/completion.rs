//! Completion client for the fine-tuned occupation classifier.
//!
//! All calls to the hosted model go through [`CompletionModel`]. The
//! production implementation talks to an OpenAI-compatible chat
//! completions endpoint with fixed sampling parameters. Failures are
//! returned once; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL_ID: &str = "ft:gpt-3.5-turbo-0613:personal::7qnGb8rm";
/// Instruction the classifier was fine-tuned with.
pub const SYSTEM_INSTRUCTION: &str = "classify this entry:";
const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no choices")]
    EmptyContent,
}

/// Anything that turns an occupation title into the model's raw label.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, title: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client bound to one model id.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionClient {
    async fn complete(&self, title: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: title,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyContent)?
            .message
            .content
            .unwrap_or_default();

        debug!(model = %self.model, raw = %content.trim(), "completion received");
        Ok(content.trim().to_string())
    }
}

/// Pull the human-readable message out of an OpenAI-style error body.
pub(crate) fn provider_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}
