//! Output formatters

pub mod json;
pub mod markdown;
pub mod terminal;

use crate::app::OutputFormat;
use quarry_core::search::{CollectionListing, SearchOutcome};
use quarry_core::{
    AgentContext, CacheStats, Conversation, Entry, MetricsSnapshot, ThreadSummary, TurnOutcome,
};
use serde::Serialize;
use std::fmt;

/// Generation and cache counters shown with traced turns and `/stats`
#[derive(Debug, Default, Serialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<MetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

impl Usage {
    pub fn of(context: &AgentContext) -> Self {
        Self {
            llm: context.llm_metrics(),
            cache: context.cache_stats(),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.llm {
            Some(llm) => writeln!(
                f,
                "LLM: {} requests ({} with tools, {} failed), avg {:.0} ms",
                llm.total_requests, llm.tool_requests, llm.total_errors, llm.avg_latency_ms
            )?,
            None => writeln!(f, "LLM: no counters")?,
        }
        match &self.cache {
            Some(cache) => writeln!(
                f,
                "Cache: {} hits, {} misses ({:.0}% hit rate)",
                cache.hits,
                cache.misses,
                cache.hit_rate * 100.0
            ),
            None => writeln!(f, "Cache: disabled"),
        }
    }
}

/// Format the result of a direct search
pub fn format_search(outcome: &SearchOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_search(outcome),
        OutputFormat::Md => markdown::format_search(outcome),
        OutputFormat::Cli => terminal::format_search(outcome),
    }
}

pub fn format_listing(listing: &CollectionListing, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(listing),
        OutputFormat::Md => markdown::format_listing(listing),
        OutputFormat::Cli => listing.to_string(),
    }
}

/// Format one finished turn; a trace adds every entry it appended and the
/// usage counters
pub fn format_turn(
    conversation: &Conversation,
    outcome: &TurnOutcome,
    trace: Option<&Usage>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => json::format_turn(conversation, outcome, trace),
        OutputFormat::Md => match trace {
            Some(usage) => format!(
                "{}```text\n{}```\n",
                markdown::format_entries(outcome.entries(conversation)),
                usage
            ),
            None => format!("{}\n", outcome.answer),
        },
        OutputFormat::Cli => terminal::format_turn(conversation, outcome, trace),
    }
}

pub fn format_usage(usage: &Usage, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(usage),
        OutputFormat::Md | OutputFormat::Cli => usage.to_string(),
    }
}

/// Thread list; `current` is marked
pub fn format_threads(threads: &[ThreadSummary], current: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(threads),
        OutputFormat::Md => markdown::format_threads(threads),
        OutputFormat::Cli => terminal::format_threads(threads, current),
    }
}

/// One match of an in-conversation find, `position` counting from 1
pub fn format_found(entry: &Entry, position: usize, total: usize) -> String {
    format!("[{}/{}]\n{}", position, total, terminal::format_entry(entry))
}

/// Export a whole conversation
pub fn format_conversation(conversation: &Conversation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(conversation),
        OutputFormat::Md | OutputFormat::Cli => markdown::format_conversation(conversation),
    }
}

/// Export every conversation of the session
pub fn format_all_conversations(conversations: &[Conversation], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(conversations),
        OutputFormat::Md | OutputFormat::Cli => conversations
            .iter()
            .map(markdown::format_conversation)
            .collect::<Vec<_>>()
            .join("\n---\n\n"),
    }
}
