//! Answer pipeline types.

use crate::config::KnowledgeConfig;
use crate::hybrid::RankOptions;
use crate::types::SearchResult;
use chrono::{DateTime, Utc};
use compliance_guardrails::GuardrailVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-question options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AskOptions {
    /// Lexical weight in `[0, 1]`
    pub alpha: f32,

    /// Passages to retrieve
    pub top_k: usize,

    /// Fuzzy rerank of the retrieved passages
    pub rerank: bool,

    /// Generate an answer; otherwise return the passages only
    pub use_llm: bool,
}

impl AskOptions {
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self {
            alpha: config.alpha,
            top_k: config.top_k,
            rerank: config.rerank,
            use_llm: true,
        }
    }

    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            k: self.top_k,
            alpha: self.alpha,
            rerank: self.rerank,
        }
    }
}

impl Default for AskOptions {
    fn default() -> Self {
        Self::from_config(&KnowledgeConfig::default())
    }
}

/// A generated, checked answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    pub question: String,

    /// Final answer shown to the user, citations included
    pub answer: String,

    /// First generation, before any repair
    pub draft_answer: String,

    /// Citation block for the retrieved passages
    pub citations: String,

    /// Guardrail outcome for the draft
    pub verdict: GuardrailVerdict,

    /// Whether the repair pass replaced the draft
    pub repaired: bool,

    /// Passages in ranked order
    pub passages: Vec<SearchResult>,
}

/// Which LLM step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Generate,
    Repair,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Repair => write!(f, "repair"),
        }
    }
}

/// Terminal state of one question.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Question was blank
    EmptyQuestion,

    /// Retrieval found nothing; no LLM call was made
    NoResults,

    /// Passages-only mode
    Passages(Vec<SearchResult>),

    Answered(Box<AnswerReport>),

    /// An LLM call failed; shown in place of an answer
    Failed {
        stage: FailureStage,
        message: String,
        passages: Vec<SearchResult>,
    },
}

impl Outcome {
    /// Message shown when there is no answer to display.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::EmptyQuestion => Some("Please enter a question.".to_string()),
            Self::NoResults => Some("Nothing found.".to_string()),
            Self::Failed { stage, message, .. } => {
                Some(format!("Failed to {} an answer: {}", stage, message))
            }
            Self::Passages(_) | Self::Answered(_) => None,
        }
    }
}

/// One answered question, as recorded in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub citations: String,
    pub guardrail_outcome: GuardrailVerdict,
}

impl LogEntry {
    pub fn from_report(report: &AnswerReport) -> Self {
        Self {
            timestamp: Utc::now(),
            question: report.question.clone(),
            answer: report.answer.clone(),
            citations: report.citations.clone(),
            guardrail_outcome: report.verdict.clone(),
        }
    }
}
