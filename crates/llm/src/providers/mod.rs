//! Concrete model providers and the HTTP plumbing they share.

pub mod claude;
pub mod ollama;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;

use pipewrench_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client with an optional whole-request timeout.
pub(crate) fn http_client(timeout: Option<Duration>) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared request and decode a JSON body.
///
/// Transport failures, non-2xx statuses and undecodable bodies all become
/// `AppError::Provider` naming the provider.
pub(crate) async fn send_json<R: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> AppResult<R> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Provider(format!("Failed to reach {}: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(AppError::Provider(format!(
            "{} returned {}: {}",
            provider,
            status,
            body.trim()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Provider(format!("Invalid {} response: {}", provider, e)))
}
