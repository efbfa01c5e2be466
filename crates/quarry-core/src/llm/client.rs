//! HTTP client for OpenAI-compatible chat completion services

use super::types::{ChatMessage, Decision, Role, ToolCallRequest, ToolSpec};
use crate::config::LLMServiceConfig;
use crate::error::{QuarryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for generation service clients
///
/// Plain completions return text only; tool-enabled completions may also
/// return tool calls. The agent loop relies on that split to keep tool access
/// out of the rationale and answer passes.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion without tools
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Generate chat completion with function tools bound
    async fn chat_with_tools(&self, messages: Vec<ChatMessage>, tools: &[ToolSpec])
        -> Result<Decision>;

    /// Get model name
    fn model_name(&self) -> &str;

    /// Request counters, when the client keeps any
    fn metrics(&self) -> Option<MetricsSnapshot> {
        None
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
struct APIMetrics {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    tool_requests: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub tool_requests: u64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible client (OpenAI, vLLM, Ollama, ...)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    metrics: Arc<APIMetrics>,
}

impl OpenAIClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(QuarryError::Http)?;

        Ok(Self {
            http_client,
            config,
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LLMServiceConfig::default())
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            tool_requests: self.metrics.tool_requests.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": messages.iter().map(message_to_api).collect::<Vec<_>>(),
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        if !tools.is_empty() {
            body["tools"] = tools.iter().map(tool_to_api).collect();
            body["tool_choice"] = json!("auto");
            body["parallel_tool_calls"] = json!(false);
        }

        body
    }

    async fn send(&self, body: Value) -> Result<WireMessage> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let result = self.send_inner(body).await;
        if result.is_err() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
        }

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);
        tracing::debug!("Chat completion finished in {}ms", elapsed);

        result
    }

    async fn send_inner(&self, body: Value) -> Result<WireMessage> {
        let url = format!("{}/v1/chat/completions", self.config.url.trim_end_matches('/'));

        let mut req = self.http_client.post(&url).json(&body);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QuarryError::ExternalError(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: WireResponse = response.json().await?;
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| QuarryError::Llm("No response from LLM".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let body = self.request_body(&messages, &[]);
        let message = self.send(body).await?;
        Ok(message.content.unwrap_or_default())
    }

    async fn chat_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolSpec],
    ) -> Result<Decision> {
        self.metrics.tool_requests.fetch_add(1, Ordering::Relaxed);
        let body = self.request_body(&messages, tools);
        let message = self.send(body).await?;
        Ok(message.into_decision())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn metrics(&self) -> Option<MetricsSnapshot> {
        Some(self.snapshot())
    }
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl WireMessage {
    fn into_decision(self) -> Decision {
        let tool_calls = self
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCallRequest {
                id: call.id.unwrap_or_else(|| format!("call_{}", i)),
                name: call.function.name,
                arguments: parse_arguments(call.function.arguments),
            })
            .collect();

        Decision {
            content: self.content.filter(|c| !c.trim().is_empty()),
            tool_calls,
        }
    }
}

/// Arguments arrive as a JSON-encoded string; keep the raw text if it is not JSON
fn parse_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn message_to_api(msg: &ChatMessage) -> Value {
    match msg.role {
        Role::Assistant if !msg.tool_calls.is_empty() => {
            let calls: Vec<Value> = msg
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": msg.content,
                "tool_calls": calls,
            })
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "content": msg.content_text(),
        }),
        _ => json!({"role": msg.role, "content": msg.content_text()}),
    }
}

fn tool_to_api(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}
