//! Tool registry and dispatch

use super::conversation::ToolInvocation;
use crate::error::FailureKind;
use crate::llm::ToolSpec;
use crate::search::{SearchAdapter, FAILURE_MARKER};
use crate::SEARCH_TOOL_NAME;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

/// Result count used when the caller gives none
pub const DEFAULT_MAX_RESULTS: i64 = 5;

/// Upper bound on `max_results` a caller may request
pub const MAX_RESULTS: i64 = 50;

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

/// Arguments of the `search` tool
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default, alias = "index")]
    pub collection: Option<String>,
    #[serde(default = "default_max_results", alias = "limit")]
    pub max_results: i64,
}

impl SearchArgs {
    /// Parse and validate raw tool arguments
    pub fn from_value(arguments: &Value) -> Result<Self, String> {
        if let Value::String(raw) = arguments {
            return Err(format!("arguments are not a JSON object: {}", raw));
        }
        let args: SearchArgs =
            serde_json::from_value(arguments.clone()).map_err(|e| e.to_string())?;

        if args.query.trim().is_empty() {
            return Err("'query' must not be empty".to_string());
        }
        if !(1..=MAX_RESULTS).contains(&args.max_results) {
            return Err(format!(
                "'max_results' must be between 1 and {}, got {}",
                MAX_RESULTS, args.max_results
            ));
        }
        Ok(args)
    }

    pub fn limit(&self) -> usize {
        usize::try_from(self.max_results.clamp(1, MAX_RESULTS)).unwrap_or(1)
    }
}

/// Declared contract of the `search` tool
pub fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Keyword search over one document collection. Returns ranked, formatted \
                      results as text."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search keywords"
                },
                "collection": {
                    "type": "string",
                    "description": "Collection to search (default collection when omitted)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results (default: 5)",
                    "default": DEFAULT_MAX_RESULTS,
                    "minimum": 1,
                    "maximum": MAX_RESULTS
                }
            },
            "required": ["query"]
        }),
    }
}

/// What a dispatched call produced
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub call_id: String,
    pub tool_name: String,
    pub summary: String,
    pub content: String,
    pub duration_ms: u64,
    pub failure: Option<FailureKind>,
}

impl ToolOutput {
    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }

    /// Summary block followed by the tool output
    pub fn full_text(&self) -> String {
        format!("{}{}", self.summary, self.content)
    }
}

/// Routes tool calls by name; `search` is the only registered tool
pub struct ToolDispatcher {
    adapter: Arc<SearchAdapter>,
}

impl ToolDispatcher {
    pub fn new(adapter: Arc<SearchAdapter>) -> Self {
        Self { adapter }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![search_tool_spec()]
    }

    pub fn adapter(&self) -> &SearchAdapter {
        &self.adapter
    }

    /// Execute one call. Never fails: every problem becomes output text.
    pub async fn dispatch(&self, call: &ToolInvocation) -> ToolOutput {
        let start = Instant::now();
        let summary = call_summary(call);
        tracing::info!("Executing tool: {} with args: {}", call.name, call.arguments);

        let (content, failure) = if call.name == SEARCH_TOOL_NAME {
            self.run_search(&call.arguments).await
        } else {
            tracing::error!("Unknown tool requested: {}", call.name);
            (
                format!(
                    "{} unknown tool '{}'. Available tools: {}",
                    FAILURE_MARKER, call.name, SEARCH_TOOL_NAME
                ),
                Some(FailureKind::UnknownTool),
            )
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("Tool {} completed in {}ms", call.name, duration_ms);

        ToolOutput {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            summary,
            content,
            duration_ms,
            failure,
        }
    }

    async fn run_search(&self, arguments: &Value) -> (String, Option<FailureKind>) {
        let args = match SearchArgs::from_value(arguments) {
            Ok(args) => args,
            Err(reason) => {
                tracing::warn!("Rejected search arguments: {}", reason);
                return (
                    format!(
                        "{} invalid arguments for tool '{}': {}",
                        FAILURE_MARKER, SEARCH_TOOL_NAME, reason
                    ),
                    Some(FailureKind::SchemaViolation),
                );
            }
        };

        match self
            .adapter
            .search(&args.query, args.collection.as_deref(), args.limit())
            .await
        {
            Ok(outcome) => (outcome.to_string(), None),
            Err(e) => (e.to_tool_text(), Some(e.kind())),
        }
    }
}

/// Short block naming the tool and its parameters
pub fn call_summary(call: &ToolInvocation) -> String {
    let mut out = String::from("Tool call:\n");
    let _ = writeln!(out, "- tool: `{}`", call.name);
    out.push_str("- parameters:\n");
    match &call.arguments {
        Value::Object(map) => {
            for (key, value) in map {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let _ = writeln!(out, "  - {}: `{}`", key, shown);
            }
        }
        other => {
            let _ = writeln!(out, "  - (raw): `{}`", other);
        }
    }
    out.push_str("\n---\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionRegistry;
    use crate::search::MemoryIndex;
    use serde_json::json;

    fn dispatcher() -> ToolDispatcher {
        let index = MemoryIndex::new().with_collection(
            "documents",
            vec![json!({"title": "Brake guide", "content": "Pads wear out"})],
        );
        let registry = CollectionRegistry::from_json(
            r#"{"documents": {"search_fields": ["title", "content"]}}"#,
        )
        .unwrap();
        ToolDispatcher::new(Arc::new(SearchAdapter::new(
            Arc::new(index),
            Arc::new(registry),
            "documents",
        )))
    }

    fn call(name: &str, arguments: Value) -> ToolInvocation {
        ToolInvocation {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_args_defaults_and_aliases() {
        let args = SearchArgs::from_value(&json!({"query": "brake"})).unwrap();
        assert_eq!(args.max_results, DEFAULT_MAX_RESULTS);
        assert!(args.collection.is_none());

        let args = SearchArgs::from_value(&json!({"query": "brake", "index": "docs", "limit": 3}))
            .unwrap();
        assert_eq!(args.collection.as_deref(), Some("docs"));
        assert_eq!(args.limit(), 3);
    }

    #[test]
    fn test_args_validation() {
        assert!(SearchArgs::from_value(&json!({})).is_err());
        assert!(SearchArgs::from_value(&json!({"query": "  "})).is_err());
        assert!(SearchArgs::from_value(&json!({"query": "x", "max_results": 0})).is_err());
        assert!(SearchArgs::from_value(&json!({"query": "x", "max_results": "5"})).is_err());
        assert!(SearchArgs::from_value(&Value::String("{oops".to_string())).is_err());
    }

    #[test]
    fn test_args_reject_oversized_limit() {
        let huge = json!({"query": "x", "max_results": 1_000_000_000_000i64});
        let err = SearchArgs::from_value(&huge).unwrap_err();
        assert!(err.contains("between 1 and 50"));

        let args =
            SearchArgs::from_value(&json!({"query": "x", "max_results": MAX_RESULTS})).unwrap();
        assert_eq!(args.limit(), 50);
    }

    #[test]
    fn test_call_summary() {
        let summary = call_summary(&call("search", json!({"query": "K5", "max_results": 3})));
        assert!(summary.starts_with("Tool call:\n- tool: `search`\n"));
        assert!(summary.contains("  - query: `K5`\n"));
        assert!(summary.contains("  - max_results: `3`\n"));
        assert!(summary.ends_with("---\n\n"));
    }

    #[tokio::test]
    async fn test_dispatch_search() {
        let output = dispatcher()
            .dispatch(&call("search", json!({"query": "brake"})))
            .await;
        assert!(!output.is_error());
        assert_eq!(output.call_id, "call_1");
        assert!(output.content.contains("[1] Brake guide"));
        assert!(output.full_text().starts_with("Tool call:"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let output = dispatcher().dispatch(&call("web_fetch", json!({}))).await;
        assert_eq!(output.failure, Some(FailureKind::UnknownTool));
        assert!(output.content.starts_with("Error: unknown tool 'web_fetch'"));
    }

    #[tokio::test]
    async fn test_dispatch_schema_violation() {
        let output = dispatcher()
            .dispatch(&call("search", json!({"max_results": -1})))
            .await;
        assert_eq!(output.failure, Some(FailureKind::SchemaViolation));
        assert!(output.content.starts_with(FAILURE_MARKER));
    }

    #[tokio::test]
    async fn test_dispatch_adapter_failure() {
        let output = dispatcher()
            .dispatch(&call("search", json!({"query": "x", "collection": "missing"})))
            .await;
        assert_eq!(output.failure, Some(FailureKind::NotFound));
        assert!(output.content.starts_with("Error: "));
    }
}
