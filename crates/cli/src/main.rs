//! Compliance Assistant CLI
//!
//! Answers compliance questions from a local document corpus, checks every
//! answer with guardrails and keeps a history that can be exported.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ChatCommand, ExportCommand, HistoryCommand, IngestCommand, StatsCommand,
};
use compliance_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Compliance Assistant - grounded answers with guardrails
#[derive(Parser, Debug)]
#[command(name = "compliance")]
#[command(about = "Grounded compliance answers with guardrails", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "COMPLIANCE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "COMPLIANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gigachat, ollama)
    #[arg(short, long, global = true, env = "COMPLIANCE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "COMPLIANCE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question
    Ask(AskCommand),

    /// Answer questions read line by line from stdin
    Chat(ChatCommand),

    /// Add files to the corpus
    Ingest(IngestCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),

    /// Render the answer history as Markdown
    Export(ExportCommand),

    /// Inspect or clear the answer history
    History(HistoryCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ask(_) => "ask",
            Self::Chat(_) => "chat",
            Self::Ingest(_) => "ingest",
            Self::Stats(_) => "stats",
            Self::Export(_) => "export",
            Self::History(_) => "history",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Compliance Assistant starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_compliance_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Export(cmd) => cmd.execute(&config),
        Commands::History(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
