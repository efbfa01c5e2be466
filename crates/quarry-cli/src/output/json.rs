//! JSON output formatter

use super::Usage;
use quarry_core::search::SearchOutcome;
use quarry_core::{Conversation, TurnOutcome};
use serde::Serialize;

pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_search(outcome: &SearchOutcome) -> String {
    to_pretty(outcome)
}

pub fn format_turn(
    conversation: &Conversation,
    outcome: &TurnOutcome,
    trace: Option<&Usage>,
) -> String {
    let mut value = serde_json::json!({
        "thread_id": conversation.id(),
        "answer": outcome.answer,
        "iterations": outcome.iterations,
        "tool_calls": outcome.tool_calls,
        "cached": outcome.cached,
        "states": outcome.states,
    });
    if let Some(usage) = trace {
        value["entries"] = serde_json::json!(outcome.entries(conversation));
        value["usage"] = serde_json::json!(usage);
    }
    to_pretty(&value)
}
