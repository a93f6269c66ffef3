//! Question answering over the knowledge base.
//!
//! Retrieve, generate, check guardrails, repair once if needed, enforce
//! citations and record the answer.

pub mod citations;
pub mod export;
pub mod history;
pub mod pipeline;
pub mod types;

pub use citations::{ensure_citations, format_citations, has_citation_marker};
pub use export::render_markdown;
pub use history::{HistorySink, JsonlHistory, MemoryHistory};
pub use pipeline::{AnswerPipeline, GenerationSettings, LlmStages};
pub use types::{AnswerReport, AskOptions, FailureStage, LogEntry, Outcome};
