//! Command handlers for the Compliance Assistant CLI.

pub mod ask;
pub mod chat;
pub mod export;
pub mod history;
pub mod ingest;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;

use compliance_core::{config::AppConfig, AppResult};
use compliance_knowledge::config::history_path;
use compliance_knowledge::{
    ComplianceSession, JsonlHistory, KnowledgeConfig, LlmBinding, Outcome, SearchResult,
};
use compliance_llm::{create_client, resolve_model};
use std::sync::Arc;

/// History file shared by every command in the workspace.
pub fn workspace_history(config: &AppConfig) -> JsonlHistory {
    JsonlHistory::new(history_path(&config.workspace))
}

/// Open a session over the workspace corpus.
///
/// The chat client is only created when `use_llm` is set, so passages-only
/// runs and maintenance commands work without credentials.
pub async fn open_session(config: &AppConfig, use_llm: bool) -> AppResult<ComplianceSession> {
    let knowledge = KnowledgeConfig::load(&config.workspace)?;

    let llm = if use_llm {
        config.validate()?;
        let client = create_client(config)?;
        Some(LlmBinding::new(client, resolve_model(config)))
    } else {
        None
    };

    ComplianceSession::open(
        &config.workspace,
        knowledge,
        llm,
        Arc::new(workspace_history(config)),
    )
    .await
}

/// Render an outcome for the terminal.
pub fn render_outcome(outcome: &Outcome) -> String {
    let mut out = String::new();

    if let Some(notice) = outcome.notice() {
        out.push_str(&notice);
        out.push('\n');
    }

    match outcome {
        Outcome::Answered(report) => {
            out.push_str(&report.answer);
            out.push_str("\n\n");
            out.push_str(&report.verdict.caption());
            out.push('\n');
            if report.repaired {
                out.push_str("(answer was repaired)\n");
            }
        }
        Outcome::Passages(passages) => out.push_str(&render_passages(passages)),
        Outcome::Failed { passages, .. } if !passages.is_empty() => {
            out.push('\n');
            out.push_str(&render_passages(passages));
        }
        _ => {}
    }

    out
}

fn render_passages(passages: &[SearchResult]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[{}] {} - {} (score {:.3})\n{}\n",
                i + 1,
                result.chunk.title,
                result.chunk.source_uri,
                result.score,
                result.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON form of an outcome for `--json`.
pub fn outcome_json(outcome: &Outcome) -> AppResult<serde_json::Value> {
    let value = match outcome {
        Outcome::Answered(report) => serde_json::json!({
            "status": "answered",
            "report": serde_json::to_value(report.as_ref())?,
        }),
        Outcome::Passages(passages) => serde_json::json!({
            "status": "passages",
            "passages": serde_json::to_value(passages)?,
        }),
        Outcome::Failed {
            stage,
            message,
            passages,
        } => serde_json::json!({
            "status": "failed",
            "stage": stage.to_string(),
            "message": message,
            "passages": serde_json::to_value(passages)?,
        }),
        Outcome::EmptyQuestion => serde_json::json!({ "status": "empty_question" }),
        Outcome::NoResults => serde_json::json!({ "status": "no_results" }),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_knowledge::{Chunk, FailureStage};

    fn passage(title: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: format!("{}-0", title),
                parent_document_id: title.to_string(),
                title: title.to_string(),
                source_uri: format!("file:///kb/{}", title),
                text: "Screen every counterparty.".to_string(),
                ordinal: 0,
            },
            score,
        }
    }

    #[test]
    fn test_render_passages_numbers_from_one() {
        let outcome = Outcome::Passages(vec![passage("aml.md", 0.5), passage("kyc.md", 0.25)]);
        let text = render_outcome(&outcome);
        assert!(text.starts_with("[1] aml.md - file:///kb/aml.md (score 0.500)"));
        assert!(text.contains("[2] kyc.md - file:///kb/kyc.md (score 0.250)"));
    }

    #[test]
    fn test_render_notice_outcomes() {
        assert_eq!(render_outcome(&Outcome::NoResults), "Nothing found.\n");
        assert_eq!(
            render_outcome(&Outcome::EmptyQuestion),
            "Please enter a question.\n"
        );

        let failed = Outcome::Failed {
            stage: FailureStage::Generate,
            message: "LLM error: 503".to_string(),
            passages: vec![passage("aml.md", 0.5)],
        };
        let text = render_outcome(&failed);
        assert!(text.starts_with("Failed to generate an answer: LLM error: 503\n"));
        assert!(text.contains("[1] aml.md"));
    }

    #[test]
    fn test_outcome_json_status() {
        let json = outcome_json(&Outcome::NoResults).unwrap();
        assert_eq!(json["status"], "no_results");

        let json = outcome_json(&Outcome::Passages(vec![passage("aml.md", 0.5)])).unwrap();
        assert_eq!(json["status"], "passages");
        assert_eq!(json["passages"][0]["id"], "aml.md-0");
    }
}
