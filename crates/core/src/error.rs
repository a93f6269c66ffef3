//! Error types for the Compliance Assistant.
//!
//! A single error enum covers configuration, I/O, upstream LLM, knowledge,
//! guardrail and prompt failures. Only configuration errors are fatal;
//! everything else is either recovered locally or surfaced as a visible
//! message in place of an answer.

use thiserror::Error;

/// Unified error type for the Compliance Assistant.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream LLM provider errors (HTTP failures, malformed responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// An outbound call exceeded its deadline
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Knowledge base, indexing and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Guardrail setup errors (pattern compilation, judge wiring)
    #[error("Guardrail error: {0}")]
    Guardrail(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error must stop the pipeline instead of being shown
    /// to the user as a recoverable failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
