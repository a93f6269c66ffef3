//! Stats command handler.
//!
//! Handles knowledge base statistics display.

use super::{open_session, workspace_history};
use clap::Args;
use compliance_core::{config::AppConfig, AppResult};
use compliance_knowledge::{HistorySink, KnowledgeStats};
use compliance_prompt::{list_prompts, PromptSource};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn render_stats(
    stats: &KnowledgeStats,
    answered: usize,
    prompts: &[(String, PromptSource)],
) -> String {
    let prompts = prompts
        .iter()
        .map(|(id, source)| format!("{} ({})", id, source.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Documents: {}\nChunks: {}\nSemantic index: {}\nStale: {}\nAnswered questions: {}\nPrompts: {}\n",
        stats.documents,
        stats.chunks,
        yes_no(stats.semantic_available),
        yes_no(stats.stale),
        answered,
        prompts
    )
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let session = open_session(config, false).await?;
        let stats = session.stats().await;
        let answered = workspace_history(config).entries()?.len();
        let prompts = list_prompts(&config.workspace);

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunks": stats.chunks,
                "semanticAvailable": stats.semantic_available,
                "stale": stats.stale,
                "answered": answered,
                "prompts": prompts
                    .iter()
                    .map(|(id, source)| serde_json::json!({ "id": id, "source": source }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print!("{}", render_stats(&stats, answered, &prompts));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stats() {
        let stats = KnowledgeStats {
            documents: 4,
            chunks: 9,
            semantic_available: false,
            stale: false,
        };
        let prompts = vec![
            ("compliance.answer".to_string(), PromptSource::Builtin),
            ("compliance.judge".to_string(), PromptSource::Workspace),
        ];
        assert_eq!(
            render_stats(&stats, 2, &prompts),
            "Documents: 4\nChunks: 9\nSemantic index: no\nStale: no\nAnswered questions: 2\n\
             Prompts: compliance.answer (builtin), compliance.judge (workspace)\n"
        );
    }
}
