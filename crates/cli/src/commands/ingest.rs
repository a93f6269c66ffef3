//! Ingest command handler.

use super::open_session;
use clap::Args;
use compliance_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Copy files into the workspace uploads and index them
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Markdown, text or PDF files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Ingesting {} files", self.files.len());

        let session = open_session(config, false).await?;
        let ids = session.ingest(&self.files).await?;

        for id in &ids {
            println!("Added {}", id);
        }

        let stats = session.stats().await;
        println!(
            "Knowledge base: {} documents, {} chunks",
            stats.documents, stats.chunks
        );

        Ok(())
    }
}
