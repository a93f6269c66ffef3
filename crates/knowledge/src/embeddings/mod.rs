//! Embedding providers for the semantic index.
//!
//! Providers are chosen by `KnowledgeConfig::embedding`. A provider that
//! cannot be created leaves the semantic index unavailable instead of
//! failing the session.

pub mod provider;
pub mod providers;

pub use provider::{create_backend, EmbeddingProvider};
