//! Hybrid RAG CLI
//!
//! Main entry point for the hybrid-rag command-line tool.
//! Answers questions from an Elasticsearch index with LLM-prepared hybrid
//! (keyword + semantic) retrieval.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, CheckCommand, QueryCommand};
use hybrid_rag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Hybrid RAG - question answering over Elasticsearch with RRF retrieval
#[derive(Parser, Debug)]
#[command(name = "hybrid-rag")]
#[command(about = "Question answering over Elasticsearch with hybrid RRF retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "HYBRID_RAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.hybrid-rag/config.yaml)
    #[arg(short, long, global = true, env = "HYBRID_RAG_CONFIG")]
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

    /// LLM provider (groq, openai, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Elasticsearch index to search
    #[arg(short, long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single question
    Ask(AskCommand),

    /// Show the search request a question would run, without searching
    Query(QueryCommand),

    /// Interactive question-and-answer session
    Chat(ChatCommand),

    /// Check the Elasticsearch connection and index
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file flags decide which config file is read
    let workspace = cli.workspace.clone();
    let config_file = cli.config.clone();
    let config = AppConfig::load_with(|key| match key {
        "HYBRID_RAG_WORKSPACE" => workspace.as_ref().map(|p| p.display().to_string()),
        "HYBRID_RAG_CONFIG" => config_file.as_ref().map(|p| p.display().to_string()),
        _ => std::env::var(key).ok(),
    })?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.index,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("hybrid-rag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Index: {}", config.search.index);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Query(_) => "query",
        Commands::Chat(_) => "chat",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Check(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
