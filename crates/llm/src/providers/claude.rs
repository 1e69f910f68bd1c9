//! Anthropic Claude provider implementation.
//!
//! Messages API: https://docs.anthropic.com/en/api/messages

use super::{http_client, send_json};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use pipewrench_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Anthropic API endpoint.
pub const DEFAULT_CLAUDE_URL: &str = "https://api.anthropic.com";

/// Default `anthropic-version` header value.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// The Messages API requires `max_tokens`.
const FALLBACK_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Claude LLM client.
pub struct ClaudeClient {
    base_url: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client against the public Anthropic endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_CLAUDE_URL, api_key)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the `anthropic-version` header.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.client = http_client(Some(timeout))?;
        Ok(self)
    }

    fn to_messages_request<'a>(&self, request: &'a LlmRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            system: request.system.as_deref(),
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }

    fn convert_response(&self, response: MessagesResponse) -> AppResult<LlmResponse> {
        let text = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AppError::Provider("Empty response from model".to_string()));
        }

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content: text,
            model: response.model,
            usage,
            done: response.stop_reason.as_deref() != Some("max_tokens"),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for ClaudeClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Claude messages: model {}, {} prompt chars",
            request.model,
            request.prompt.chars().count()
        );

        let http_request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.to_messages_request(request));

        let messages_response: MessagesResponse = send_json("Claude", http_request).await?;
        let converted = self.convert_response(messages_response)?;

        tracing::info!(
            "Received completion from Claude ({} output tokens)",
            converted.usage.completion_tokens
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_request_shape() {
        let client = ClaudeClient::new("sk-test");
        let request = LlmRequest::new("Question text", "claude-3-5-sonnet-20241022")
            .with_system("Only cite approved sources.");

        let body = serde_json::to_value(client.to_messages_request(&request)).unwrap();
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["max_tokens"], FALLBACK_MAX_TOKENS);
        assert_eq!(body["system"], "Only cite approved sources.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Question text");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_response_text_blocks_joined() {
        let client = ClaudeClient::new("sk-test");
        let raw: MessagesResponse = serde_json::from_str(
            r#"{
                "model": "claude-3-5-sonnet-20241022",
                "content": [
                    {"type": "text", "text": "A Class B respirator "},
                    {"type": "text", "text": "is required."}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 900, "output_tokens": 15}
            }"#,
        )
        .unwrap();

        let response = client.convert_response(raw).unwrap();
        assert_eq!(response.content, "A Class B respirator is required.");
        assert_eq!(response.usage.total_tokens, 915);
        assert!(response.done);
    }

    #[test]
    fn test_empty_content_is_provider_error() {
        let client = ClaudeClient::new("sk-test");
        let raw: MessagesResponse =
            serde_json::from_str(r#"{"model": "claude-3-5-sonnet-20241022", "content": []}"#)
                .unwrap();

        let result = client.convert_response(raw);
        assert!(matches!(result, Err(AppError::Provider(_))));
    }

    #[test]
    fn test_max_tokens_stop_marks_incomplete() {
        let client = ClaudeClient::new("sk-test");
        let raw: MessagesResponse = serde_json::from_str(
            r#"{"model": "m", "content": [{"type": "text", "text": "partial"}], "stop_reason": "max_tokens"}"#,
        )
        .unwrap();

        assert!(!client.convert_response(raw).unwrap().done);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_provider_error() {
        let client = ClaudeClient::with_base_url("http://127.0.0.1:9", "sk-test");
        let result = client
            .complete(&LlmRequest::new("ping", "claude-3-5-sonnet-20241022"))
            .await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }
}
