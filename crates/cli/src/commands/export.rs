//! Export command handler.

use super::workspace_history;
use clap::Args;
use compliance_core::{config::AppConfig, AppResult};
use compliance_knowledge::rag::render_markdown;
use compliance_knowledge::HistorySink;
use std::fs;
use std::path::PathBuf;

/// Render the answer history as a Markdown report
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let entries = workspace_history(config).entries()?;
        tracing::info!("Exporting {} history entries", entries.len());

        let report = render_markdown(&entries);

        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, report)?;
                println!("Report written to {}", path.display());
            }
            None => print!("{}", report),
        }

        Ok(())
    }
}
