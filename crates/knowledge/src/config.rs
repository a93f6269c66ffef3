//! Knowledge and pipeline settings.
//!
//! Loaded from `.compliance/knowledge.yaml`; every field has a default so
//! the file is optional and may be partial.

use compliance_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retrieval, guardrail and generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Lexical weight in the hybrid score (0 = semantic only)
    pub alpha: f32,

    /// Passages retrieved per question
    pub top_k: usize,

    /// Reorder the top-k by fuzzy similarity to the question
    pub rerank: bool,

    /// Largest n-gram used by the lexical index
    pub ngram_max: usize,

    /// Document-frequency ceiling as a fraction of the corpus
    pub max_df: f32,

    /// Directories preloaded into the corpus, relative to the workspace
    pub corpus_dirs: Vec<PathBuf>,

    /// Forbidden-phrase policy file, relative to the workspace
    pub policy_path: PathBuf,

    /// Markers that count as an existing citations section
    pub citation_markers: Vec<String>,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Deadline for each LLM call
    pub llm_timeout_secs: u64,

    pub embedding: EmbeddingSettings,
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// "trigram", "ollama" or "none"
    pub provider: String,

    pub model: String,

    pub dimensions: usize,

    /// Ollama base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 120,
            alpha: 0.5,
            top_k: 5,
            rerank: true,
            ngram_max: 2,
            max_df: 1.0,
            corpus_dirs: vec![
                PathBuf::from("samples/knowledge"),
                PathBuf::from(".compliance/uploads"),
            ],
            policy_path: PathBuf::from("samples/policy.yml"),
            citation_markers: vec!["Sources".to_string(), "Источники".to_string()],
            temperature: 0.2,
            max_tokens: 800,
            llm_timeout_secs: 60,
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl KnowledgeConfig {
    /// Load settings for a workspace, falling back to defaults when the
    /// file is absent.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let config_path = config_path(workspace);

        if !config_path.exists() {
            tracing::debug!("No knowledge config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        config.validate()?;
        tracing::debug!("Loaded knowledge config from {:?}", config_path);
        Ok(config)
    }

    /// Reject settings the chunker or ranker cannot honour.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        validate_retrieval(self.alpha, self.top_k)
    }

    /// Corpus directories resolved against the workspace.
    pub fn corpus_paths(&self, workspace: &Path) -> Vec<PathBuf> {
        self.corpus_dirs
            .iter()
            .map(|dir| resolve(workspace, dir))
            .collect()
    }

    pub fn policy_file(&self, workspace: &Path) -> PathBuf {
        resolve(workspace, &self.policy_path)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

/// Check per-query retrieval parameters.
pub fn validate_retrieval(alpha: f32, top_k: usize) -> AppResult<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(AppError::Config(format!(
            "alpha must be within [0, 1], got {}",
            alpha
        )));
    }
    if top_k == 0 {
        return Err(AppError::Config("top_k must be at least 1".to_string()));
    }
    Ok(())
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(".compliance").join("knowledge.yaml")
}

/// Where `ingest` copies uploaded files.
pub fn uploads_dir(workspace: &Path) -> PathBuf {
    workspace.join(".compliance").join("uploads")
}

/// Persistent answer history.
pub fn history_path(workspace: &Path) -> PathBuf {
    workspace.join(".compliance").join("history.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeConfig::load(temp.path()).unwrap();

        assert_eq!(config.chunk_size, 900);
        assert_eq!(config.chunk_overlap, 120);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.embedding.provider, "trigram");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "alpha: 0.8\nembedding:\n  provider: none\n").unwrap();

        let config = KnowledgeConfig::load(temp.path()).unwrap();
        assert_eq!(config.alpha, 0.8);
        assert_eq!(config.embedding.provider, "none");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.max_tokens, 800);
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeConfig {
            chunk_size: 400,
            rerank: false,
            ..Default::default()
        };

        let path = config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();
        let loaded = KnowledgeConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_out_of_range_alpha_rejected() {
        let temp = TempDir::new().unwrap();
        let path = config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "alpha: 1.5\n").unwrap();

        let err = KnowledgeConfig::load(temp.path()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let temp = TempDir::new().unwrap();
        let path = config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chunk_size: 0\n").unwrap();

        let err = KnowledgeConfig::load(temp.path()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("chunk_size"));

        let config = KnowledgeConfig {
            chunk_size: 1,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_retrieval() {
        assert!(validate_retrieval(0.0, 1).is_ok());
        assert!(validate_retrieval(1.0, 10).is_ok());
        assert!(validate_retrieval(-0.1, 5).is_err());
        assert!(validate_retrieval(0.5, 0).is_err());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let config = KnowledgeConfig::default();
        let ws = Path::new("/srv/ws");
        assert_eq!(config.policy_file(ws), PathBuf::from("/srv/ws/samples/policy.yml"));
        assert_eq!(config.corpus_paths(ws)[1], PathBuf::from("/srv/ws/.compliance/uploads"));
        assert_eq!(uploads_dir(ws), PathBuf::from("/srv/ws/.compliance/uploads"));
    }
}
