//! Ollama provider (`POST /api/generate`, non-streaming).

use super::{http_client, send_json};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use pipewrench_core::AppResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "GenerateOptions::is_empty")]
    options: GenerateOptions,
    stream: bool,
}

#[derive(Debug, Default, Serialize, PartialEq)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Ollama's name for the output token limit
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

impl From<GenerateResponse> for LlmResponse {
    fn from(raw: GenerateResponse) -> Self {
        Self {
            content: raw.response,
            model: raw.model,
            usage: LlmUsage::new(raw.prompt_eval_count, raw.eval_count),
            done: raw.done,
        }
    }
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for the default local endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.client = http_client(Some(timeout))?;
        Ok(self)
    }

    fn generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Ollama generate: model {}, {} prompt chars",
            request.model,
            request.prompt.chars().count()
        );

        let http_request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_request(request));

        let raw: GenerateResponse = send_json("Ollama", http_request).await?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewrench_core::AppError;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OllamaClient::with_base_url("http://localhost:8080/");
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_generate_request_body() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_temperature(0.5)
            .with_max_tokens(100);

        let body = serde_json::to_value(client.generate_request(&request)).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "Hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert_eq!(body["options"]["num_predict"], 100);
    }

    #[test]
    fn test_generate_request_omits_empty_options() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2");

        let body = serde_json::to_value(client.generate_request(&request)).unwrap();
        assert!(body.get("options").is_none());
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_generate_response_conversion() {
        let raw: GenerateResponse = serde_json::from_str(
            r#"{"model":"llama3.2","response":"See https://www.osha.gov/confined-spaces","done":true,"prompt_eval_count":40,"eval_count":12}"#,
        )
        .unwrap();

        let response = LlmResponse::from(raw);
        assert_eq!(response.content, "See https://www.osha.gov/confined-spaces");
        assert_eq!(response.usage, LlmUsage::new(40, 12));
        assert!(response.done);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_provider_error() {
        let client = OllamaClient::with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let result = client.complete(&LlmRequest::new("ping", "llama3.2")).await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }
}
