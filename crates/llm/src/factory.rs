//! LLM provider factory.
//!
//! Builds the chat client named by the application configuration and
//! resolves its credentials.

use crate::client::LlmClient;
use crate::providers::{GigaChatClient, GigaChatSettings, OllamaClient};
use crate::types::ProviderType;
use compliance_core::config::ProviderConfig;
use compliance_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 60;

/// Create the chat client for `config.provider`.
///
/// # Errors
/// Returns [`AppError::Config`] if the provider is unknown or GigaChat
/// has no authorization key.
pub fn create_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&config.provider).ok_or_else(|| {
        AppError::Config(format!("Unknown provider: {}", config.provider))
    })?;

    let provider_config = config.get_provider_config(provider.as_str());

    match provider {
        ProviderType::Ollama => {
            let (endpoint, timeout) = match &provider_config {
                Some(ProviderConfig::Ollama {
                    endpoint, timeout, ..
                }) => (
                    endpoint.clone(),
                    timeout.unwrap_or(DEFAULT_OLLAMA_TIMEOUT_SECS),
                ),
                _ => (
                    DEFAULT_OLLAMA_ENDPOINT.to_string(),
                    DEFAULT_OLLAMA_TIMEOUT_SECS,
                ),
            };
            tracing::debug!("Using Ollama at {}", endpoint);
            Ok(Arc::new(OllamaClient::with_base_url(endpoint, timeout)))
        }
        ProviderType::GigaChat => {
            let key = config.resolve_api_key(provider.as_str());
            let mut settings = GigaChatSettings::resolve(key.as_deref(), provider_config.as_ref())?;
            settings.model = resolve_model(config);
            Ok(Arc::new(GigaChatClient::new(settings)?))
        }
    }
}

/// Model every request should name.
///
/// Precedence: `--model` / `COMPLIANCE_MODEL`, then `GIGACHAT_MODEL` for
/// GigaChat, then the provider block in the config file, then the default.
pub fn resolve_model(config: &AppConfig) -> String {
    pick_model(config, std::env::var("GIGACHAT_MODEL").ok())
}

fn pick_model(config: &AppConfig, gigachat_env: Option<String>) -> String {
    if config.model_pinned {
        return config.model.clone();
    }

    let is_gigachat = ProviderType::parse(&config.provider) == Some(ProviderType::GigaChat);
    match gigachat_env.map(|m| m.trim().to_string()) {
        Some(model) if is_gigachat && !model.is_empty() => model,
        _ => config.model.clone(),
    }
}
