//! OpenAI chat-completions client

use super::traits::*;
use crate::config::CompletionSettings;
use crate::network::{HttpClient, HttpRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A chat message in OpenAI format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for /chat/completions
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI completion client
pub struct OpenAi {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl OpenAi {
    pub fn new(client: HttpClient, settings: &CompletionSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.timeout(),
        }
    }

    /// Build the chat request for a turn
    pub fn chat_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(&request.system_instruction),
                ChatMessage::user(request.user_prompt()),
            ],
            max_tokens: request.max_output_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl Completer for OpenAi {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = serde_json::to_value(self.chat_request(request))?;
        let mut http_request = HttpRequest::post(format!("{}/chat/completions", self.base_url))
            .json(body)
            .timeout(self.timeout);

        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer(key);
        }

        let response = self.client.execute(http_request).await?;

        if !response.is_success() {
            return Err(CompletionError::Http {
                status: response.status,
                body: response.text,
            });
        }

        let parsed: ChatCompletionResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::Empty)
    }
}
