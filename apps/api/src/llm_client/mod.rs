//! Single point of entry for every text-completion call in HireWise.
//!
//! No other module talks to the provider API; everything goes through
//! `TextProvider`. `LlmClient` speaks the OpenAI-compatible chat-completions
//! protocol (OpenRouter by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No text provider is configured")]
    NotConfigured,
}

/// One chat-style completion: an optional system message and one user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Opaque text-completion service. `AppState` carries it as `Arc<dyn TextProvider>`
/// so tests can substitute scripted providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
    /// Legacy completion-style providers put the output here instead.
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text of the first choice, preferring the chat message content.
    pub fn text(&self) -> Option<&str> {
        let choice = self.choices.first()?;
        choice
            .message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .or(choice.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// HTTP implementation of `TextProvider`.
/// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    site_url: Option<String>,
    site_title: Option<String>,
}

impl LlmClient {
    /// Builds a client, or `None` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint: chat_completions_url(&config.base_url),
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries.max(1),
            site_url: config.site_url.clone(),
            site_title: config.site_title.clone(),
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw call to the provider, returning the full response object.
    pub async fn call(&self, request: &CompletionRequest<'_>) -> Result<ChatResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut builder = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body);
            if let Some(site_url) = &self.site_url {
                builder = builder.header("HTTP-Referer", site_url);
            }
            if let Some(site_title) = &self.site_title {
                builder = builder.header("X-Title", site_title);
            }

            let response = match builder.send().await {
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
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

#[async_trait]
impl TextProvider for LlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(&request).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyContent)
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(String::from),
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            model: "test-model".to_string(),
            max_retries: 0,
            site_url: None,
            site_title: None,
        }
    }

    #[test]
    fn test_from_config_without_key_is_none() {
        assert!(LlmClient::from_config(&config(None)).unwrap().is_none());
    }

    #[test]
    fn test_from_config_normalizes_endpoint_and_retries() {
        let client = LlmClient::from_config(&config(Some("sk-test")))
            .unwrap()
            .unwrap();
        assert_eq!(client.endpoint, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(client.max_retries, 1);
        assert_eq!(client.model(), "test-model");
    }

    #[test]
    fn test_response_text_prefers_message_content() {
        let json = r#"{"choices":[{"message":{"content":"React, Node.js"},"text":"ignored"}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("React, Node.js"));
    }

    #[test]
    fn test_response_text_falls_back_to_legacy_text() {
        let json = r#"{"choices":[{"text":"Python; Django"}],"usage":{"prompt_tokens":3,"completion_tokens":4}}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Python; Django"));
        assert_eq!(response.usage.unwrap().completion_tokens, 4);
    }

    #[test]
    fn test_response_text_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_chat_request_serializes_system_and_user_messages() {
        let body = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.0,
            max_tokens: 200,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 200);
    }
}
