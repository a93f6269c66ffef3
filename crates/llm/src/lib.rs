//! LLM integration crate for the Compliance Assistant.
//!
//! Provides a provider-agnostic chat-completion abstraction used for answer
//! generation, judging and repair.
//!
//! # Providers
//! - **GigaChat**: hosted chat completions with cached OAuth tokens (default)
//! - **Ollama**: local LLM runtime
//! - **Scripted**: canned responses for tests and offline dry runs
//!
//! # Example
//! ```no_run
//! use compliance_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is KYC?", "llama3.2").with_temperature(0.2);
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
pub use client::{complete_with_timeout, ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, resolve_model};
pub use providers::{GigaChatClient, GigaChatSettings, OllamaClient, ScriptedClient, ScriptedReply};
pub use types::ProviderType;
