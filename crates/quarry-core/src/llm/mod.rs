//! Generation service integration
//!
//! Provides:
//! - Chat message and tool-call types for OpenAI-compatible endpoints
//! - The `LLMClient` trait the agent loop talks through
//! - `OpenAIClient`, an HTTP implementation with request metrics

mod client;
mod types;

pub use client::{LLMClient, MetricsSnapshot, OpenAIClient};
pub use types::{ChatMessage, Decision, Role, ToolCallRequest, ToolSpec};
