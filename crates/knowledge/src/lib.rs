//! Knowledge base and answer pipeline for the Compliance Assistant.
//!
//! Documents are chunked and indexed with a hybrid lexical + semantic
//! ranker; questions run through retrieval, generation, guardrails, a single
//! repair pass and citation enforcement.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod fuzzy;
pub mod hybrid;
pub mod ingest;
pub mod knowledge_base;
pub mod lexical;
pub mod parser;
pub mod rag;
pub mod semantic;
pub mod session;
pub mod types;


// Re-export commonly used types
pub use config::{EmbeddingSettings, KnowledgeConfig};
pub use hybrid::{HybridIndex, RankOptions};
pub use knowledge_base::{ChunkSettings, KnowledgeBase};
pub use lexical::{LexicalIndex, LexicalOptions};
pub use rag::{
    AnswerPipeline, AnswerReport, AskOptions, FailureStage, HistorySink, JsonlHistory, LogEntry,
    MemoryHistory, Outcome,
};
pub use semantic::{SemanticBackend, SemanticIndex};
pub use session::{ComplianceSession, LlmBinding};
pub use types::{Chunk, Document, KnowledgeStats, SearchResult};
