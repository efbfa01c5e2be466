//! Markdown output formatter

use quarry_core::search::{CollectionListing, SearchOutcome};
use quarry_core::{Conversation, Entry, EntryKind, ThreadSummary};

pub fn format_search(outcome: &SearchOutcome) -> String {
    let mut output = String::from("# Search Results\n\n");

    match outcome {
        SearchOutcome::Found(report) => {
            output.push_str(&format!(
                "*{} of {} matches in `{}`*\n\n",
                report.hits.len(),
                report.total,
                report.collection
            ));
            for hit in &report.hits {
                output.push_str(&format!(
                    "## {}. {} (Score: {:.2})\n\n",
                    hit.rank, hit.title, hit.score
                ));
                output.push_str(&hit.content.replace("\n   ", "\n"));
                output.push_str("\n\n");
                if let Some(ref url) = hit.url {
                    output.push_str(&format!("- **URL**: <{}>\n\n", url));
                }
                output.push_str("---\n\n");
            }
        }
        SearchOutcome::NoResults { .. } => output.push_str("*No results found*\n"),
    }

    output
}

pub fn format_listing(listing: &CollectionListing) -> String {
    let mut output = String::from("# Collections\n\n");
    for name in &listing.names {
        output.push_str(&format!("- `{}`\n", name));
    }
    output
}

pub fn format_threads(threads: &[ThreadSummary]) -> String {
    let mut output = String::from("# Threads\n\n");
    for thread in threads {
        output.push_str(&format!(
            "- `{}` ({} entries): {}\n",
            thread.id,
            thread.entry_count,
            thread.title.as_deref().unwrap_or("*empty*")
        ));
    }
    output
}

pub fn format_conversation(conversation: &Conversation) -> String {
    let mut output = format!("# Conversation {}\n\n", conversation.id());
    output.push_str(&format!(
        "*Started {}*\n\n",
        conversation.created_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format_entries(conversation.entries()));
    output
}

pub fn format_entries(entries: &[Entry]) -> String {
    let mut output = String::new();

    for entry in entries {
        match &entry.kind {
            EntryKind::User { content } => {
                output.push_str(&format!("## User\n\n{}\n\n", content));
            }
            EntryKind::Thinking { content } => {
                output.push_str(&format!("### Thinking\n\n{}\n\n", content));
            }
            EntryKind::ToolCall { call } => {
                output.push_str(&format!(
                    "### Tool call `{}`\n\n```json\n{}\n```\n\n",
                    call.name,
                    serde_json::to_string_pretty(&call.arguments)
                        .unwrap_or_else(|_| call.arguments.to_string())
                ));
            }
            EntryKind::ToolResult {
                content,
                duration_ms,
                ..
            } => {
                output.push_str(&format!(
                    "### Tool result ({} ms)\n\n```text\n{}\n```\n\n",
                    duration_ms,
                    content.trim_end()
                ));
            }
            EntryKind::Final { content } => {
                output.push_str(&format!("## Assistant\n\n{}\n\n", content));
            }
        }
    }

    output
}
