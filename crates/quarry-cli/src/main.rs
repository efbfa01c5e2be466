//! Quarry CLI
//!
//! Conversational search over Elasticsearch collections.

use anyhow::Result;
use clap::Parser;
use quarry_core::error::exit_codes;
use quarry_core::search::AdapterError;
use quarry_core::{AgentContext, Config, FailureKind, MemoryIndex, QuarryError};
use std::sync::Arc;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut context = AgentContext::from_config(config)?;

    if let Some(ref path) = cli.memory_index {
        let index = MemoryIndex::from_json_file(path)?;
        tracing::info!(
            "Using in-memory index from {} ({} documents)",
            path.display(),
            index.document_count()
        );
        context = context.with_index(Arc::new(index));
    }

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, context, cli.format).await,
        Commands::Chat(args) => commands::chat::run(args, context, cli.format).await,
        Commands::Search(args) => commands::search::run(args, &context, cli.format).await,
        Commands::Collections => commands::collections::run(&context, cli.format).await,
        Commands::Config => commands::config::run(&context, cli.format).await,
        Commands::Health => commands::health::run(&context, cli.format).await,
        Commands::Mcp => quarry_mcp::start_server(context.adapter()).await,
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<QuarryError>() {
        return e.exit_code();
    }
    match err.downcast_ref::<AdapterError>().map(AdapterError::kind) {
        Some(FailureKind::NotFound) => exit_codes::NOT_FOUND,
        Some(FailureKind::ConfigurationError | FailureKind::NoSearchableFields) => {
            exit_codes::INVALID_INPUT
        }
        _ => exit_codes::GENERAL_ERROR,
    }
}
