//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(
    author,
    version,
    about = "Ask questions answered from your Elasticsearch collections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Search a JSON file of `{collection: [documents]}` instead of Elasticsearch
    #[arg(long, global = true, env = "QUARRY_MEMORY_INDEX")]
    pub memory_index: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask one question and print the answer
    Ask(AskArgs),

    /// Interactive multi-turn conversation
    Chat(ChatArgs),

    /// Run the search tool directly
    Search(SearchArgs),

    /// List collections in the search index
    Collections,

    /// Show the configured collections
    Config,

    /// Check the search index connection
    Health,

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question
    pub query: Vec<String>,

    /// Collection searched when the agent names none
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Print every conversation entry of the turn
    #[arg(long)]
    pub trace: bool,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Collection searched when the agent names none
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Print every conversation entry of each turn
    #[arg(long)]
    pub trace: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: Vec<String>,

    /// Collection to search
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Number of results
    #[arg(short = 'n', default_value = "5")]
    pub limit: usize,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
    Md,
}
