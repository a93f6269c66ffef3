//! Chat command handler.
//!
//! One session answers every line read from stdin, so the index is built
//! once and history accumulates across questions.

use super::{open_session, render_outcome};
use clap::Args;
use compliance_core::{config::AppConfig, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Answer questions interactively
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Return passages only, without the LLM
    #[arg(long)]
    pub no_llm: bool,

    /// Lexical weight in the hybrid score
    #[arg(long)]
    pub alpha: Option<f32>,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit" | ":q")
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let session = open_session(config, !self.no_llm).await?;
        let mut options = session.ask_options();
        options.use_llm = !self.no_llm;
        if let Some(alpha) = self.alpha {
            options.alpha = alpha;
        }
        if let Some(top_k) = self.top_k {
            options.top_k = top_k;
        }

        let stats = session.stats().await;
        let mode = if session.has_llm() {
            "answers"
        } else {
            "passages only"
        };
        eprintln!(
            "{} documents, {} chunks indexed ({}). Type 'exit' to quit.",
            stats.documents, stats.chunks, mode
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if is_exit(&line) {
                break;
            }

            match session.ask(&line, &options).await {
                Ok(outcome) => println!("{}", render_outcome(&outcome)),
                // Invalid settings stay invalid for every question
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("  quit \n"));
        assert!(!is_exit("how to exit a sanctions list?"));
        assert!(!is_exit(""));
    }
}
