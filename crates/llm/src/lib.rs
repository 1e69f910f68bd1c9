//! Model provider crate for PipeWrench.
//!
//! A provider-agnostic `LlmClient` trait plus Claude and Ollama
//! implementations. The answer pipeline treats any client as the single
//! "generate text from a prompt" capability.
//!
//! # Example
//! ```no_run
//! use pipewrench_llm::{LlmClient, LlmRequest, providers::ClaudeClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeClient::new("sk-ant-...");
//! let request = LlmRequest::new("What is a confined space?", "claude-3-5-sonnet-20241022");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ProviderSettings};
pub use providers::{ClaudeClient, OllamaClient};
pub use types::ProviderType;
