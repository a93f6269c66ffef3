//! Chat provider implementations.

pub mod gigachat;
pub mod ollama;
pub mod scripted;

pub use gigachat::{GigaChatClient, GigaChatSettings};
pub use ollama::OllamaClient;
pub use scripted::{ScriptedClient, ScriptedReply};
