//! History command handler.

use super::workspace_history;
use clap::{Args, Subcommand};
use compliance_core::{config::AppConfig, AppResult};
use compliance_knowledge::HistorySink;

/// Inspect or clear the answer history
#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List answered questions
    List,

    /// Delete every history entry
    Clear,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let history = workspace_history(config);

        match self.action {
            HistoryAction::List => {
                for (i, entry) in history.entries()?.iter().enumerate() {
                    println!(
                        "{}. [{}] {}",
                        i + 1,
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.question
                    );
                }
            }
            HistoryAction::Clear => {
                history.clear()?;
                tracing::info!("Cleared history at {:?}", history.path());
                println!("History cleared");
            }
        }

        Ok(())
    }
}
