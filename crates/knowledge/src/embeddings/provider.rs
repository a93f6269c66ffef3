//! Embedding provider trait and factory.

use crate::config::EmbeddingSettings;
use crate::semantic::SemanticBackend;
use compliance_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Build the semantic backend described by `settings`.
///
/// Never fails: `none`, unknown providers and providers that cannot be
/// constructed all yield [`SemanticBackend::Unavailable`].
pub fn create_backend(settings: &EmbeddingSettings) -> SemanticBackend {
    let provider: AppResult<Arc<dyn EmbeddingProvider>> = match settings.provider.as_str() {
        "none" | "" => {
            tracing::info!("Semantic index disabled by configuration");
            return SemanticBackend::Unavailable;
        }

        "trigram" => Ok(Arc::new(super::providers::TrigramProvider::new(
            settings.dimensions,
        ))),

        "ollama" => super::providers::OllamaProvider::new(
            &settings.model,
            settings.dimensions,
            settings.endpoint.as_deref(),
        )
        .map(|p| Arc::new(p) as Arc<dyn EmbeddingProvider>),

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, none",
            other
        ))),
    };

    match provider {
        Ok(provider) => {
            tracing::debug!(
                "Embedding provider '{}' (model: {}, dimensions: {})",
                provider.provider_name(),
                provider.model_name(),
                provider.dimensions()
            );
            SemanticBackend::Available(provider)
        }
        Err(e) => {
            tracing::warn!("Semantic index unavailable: {}", e);
            SemanticBackend::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trigram_backend_is_available() {
        let backend = create_backend(&settings("trigram"));
        assert!(backend.is_available());
    }

    #[test]
    fn test_none_and_unknown_are_unavailable() {
        assert!(!create_backend(&settings("none")).is_available());
        assert!(!create_backend(&settings("word2vec")).is_available());
    }

    #[test]
    fn test_ollama_backend_builds_without_connecting() {
        let backend = create_backend(&EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: Some("http://127.0.0.1:9".to_string()),
        });
        assert!(backend.is_available());
    }

    #[tokio::test]
    async fn test_default_embed_uses_batch() {
        let provider = super::super::providers::TrigramProvider::new(64);
        let single = provider.embed("sanctions screening").await.unwrap();
        let batch = provider
            .embed_batch(&["sanctions screening".to_string()])
            .await
            .unwrap();
        assert_eq!(single, batch[0]);
    }
}
