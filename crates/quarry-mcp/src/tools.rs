//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::Result;
use quarry_core::agent::tools::{search_tool_spec, SearchArgs};
use quarry_core::search::FAILURE_MARKER;
use quarry_core::SearchAdapter;
use serde_json::Value;

pub fn search_tool_definition() -> ToolDefinition {
    let spec = search_tool_spec();
    ToolDefinition {
        name: spec.name,
        description: spec.description,
        input_schema: spec.parameters,
    }
}

pub fn list_collections_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_collections".to_string(),
        description: "List the collections available in the search index".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn all_tool_definitions() -> Vec<ToolDefinition> {
    vec![search_tool_definition(), list_collections_tool_definition()]
}

pub async fn handle_search(adapter: &SearchAdapter, args: Value) -> Result<ToolResult> {
    let args = match SearchArgs::from_value(&args) {
        Ok(args) => args,
        Err(reason) => {
            return Ok(ToolResult::failure(format!(
                "{} invalid arguments: {}",
                FAILURE_MARKER, reason
            )))
        }
    };

    let result = match adapter
        .search(&args.query, args.collection.as_deref(), args.limit())
        .await
    {
        Ok(outcome) => {
            ToolResult::text(outcome.to_string()).with_structured(serde_json::to_value(&outcome)?)
        }
        Err(e) => ToolResult::failure(e.to_tool_text()).with_structured(serde_json::json!({
            "error": e.kind(),
            "message": e.to_string(),
        })),
    };

    Ok(result)
}

pub async fn handle_list_collections(adapter: &SearchAdapter) -> Result<ToolResult> {
    let result = match adapter.list_collections().await {
        Ok(listing) => {
            ToolResult::text(listing.to_string()).with_structured(serde_json::to_value(&listing)?)
        }
        Err(e) => ToolResult::failure(e.to_tool_text()),
    };
    Ok(result)
}
