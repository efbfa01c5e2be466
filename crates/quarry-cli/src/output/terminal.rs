//! Terminal output formatter

use super::Usage;
use quarry_core::search::SearchOutcome;
use quarry_core::{Conversation, Entry, EntryKind, ThreadSummary, TurnOutcome};

pub fn format_search(outcome: &SearchOutcome) -> String {
    let mut output = outcome.to_string();
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

pub fn format_turn(
    conversation: &Conversation,
    outcome: &TurnOutcome,
    trace: Option<&Usage>,
) -> String {
    let mut output = String::new();

    if let Some(usage) = trace {
        for entry in outcome.entries(conversation) {
            output.push_str(&format_entry(entry));
        }
        output.push_str(&format!(
            "--- {} iterations, {} tool calls{}\n{}\n",
            outcome.iterations,
            outcome.tool_calls,
            if outcome.cached { " (cached answer)" } else { "" },
            usage
        ));
    }

    output.push_str(&outcome.answer);
    output.push('\n');
    output
}

pub fn format_threads(threads: &[ThreadSummary], current: &str) -> String {
    if threads.is_empty() {
        return "No threads\n".to_string();
    }

    let mut output = String::new();
    for thread in threads {
        output.push_str(&format!(
            "{} {}  {:>3} entries  {}  {}\n",
            if thread.id == current { '*' } else { ' ' },
            thread.id,
            thread.entry_count,
            thread.created_at.format("%Y-%m-%d %H:%M"),
            thread.title.as_deref().unwrap_or("(empty)")
        ));
    }
    output
}

pub fn format_entry(entry: &Entry) -> String {
    let body = match &entry.kind {
        EntryKind::User { content } => content.clone(),
        EntryKind::Thinking { content } | EntryKind::Final { content } => content.clone(),
        EntryKind::ToolCall { call } => {
            format!("{} {} (id: {})", call.name, call.arguments, call.id)
        }
        EntryKind::ToolResult {
            content,
            duration_ms,
            failure,
            ..
        } => match failure {
            Some(kind) => format!("[{}, {}ms]\n{}", kind, duration_ms, content),
            None => format!("[{}ms]\n{}", duration_ms, content),
        },
    };

    format!("{:>3} {:<11} {}\n\n", entry.ordinal, entry.kind.label(), body.trim_end())
}
