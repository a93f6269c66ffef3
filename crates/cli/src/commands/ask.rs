//! Ask command handler.
//!
//! Runs one question through retrieval, generation and guardrails.

use super::{open_session, outcome_json, render_outcome};
use clap::Args;
use compliance_core::{config::AppConfig, AppResult};
use compliance_knowledge::AskOptions;

/// Ask one question against the workspace corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Lexical weight in the hybrid score (0 = semantic only, 1 = lexical only)
    #[arg(long)]
    pub alpha: Option<f32>,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Return the retrieved passages without calling the LLM
    #[arg(long)]
    pub no_llm: bool,

    /// Skip fuzzy reranking of the retrieved passages
    #[arg(long)]
    pub no_rerank: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let session = open_session(config, !self.no_llm).await?;
        let options = self.apply(session.ask_options());

        let outcome = session.ask(&self.question, &options).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&outcome_json(&outcome)?)?;
            println!("{}", json);
        } else {
            print!("{}", render_outcome(&outcome));
        }

        Ok(())
    }

    /// Overlay command-line flags on the configured defaults.
    fn apply(&self, mut options: AskOptions) -> AskOptions {
        if let Some(alpha) = self.alpha {
            options.alpha = alpha;
        }
        if let Some(top_k) = self.top_k {
            options.top_k = top_k;
        }
        if self.no_rerank {
            options.rerank = false;
        }
        options.use_llm = !self.no_llm;
        options
    }
}
