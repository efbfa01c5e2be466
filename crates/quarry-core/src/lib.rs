//! Quarry Core Library
//!
//! Core functionality for the quarry conversational retrieval agent.
//!
//! # Features
//! - Per-collection search configuration loaded from a declarative JSON file
//! - Fuzzy multi-field full-text search against Elasticsearch (or an in-memory index)
//! - Generic result rendering through a closed set of display templates
//! - A reason/act loop that decides when to search and when to answer
//! - Append-only conversation state keyed by thread id
//! - An answer cache for repeated opening questions

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod search;

pub use agent::{
    CacheStats, Conversation, Entry, EntryKind, LoopState, ReactAgent, ResponseCache,
    SessionStore, ThreadSummary, ToolDispatcher, ToolInvocation, ToolOutput, TurnOutcome,
};
pub use config::{
    AgentConfig, CollectionConfig, CollectionRegistry, Config, ElasticsearchConfig,
    LLMServiceConfig, ResultFormat,
};
pub use context::AgentContext;
pub use error::{FailureKind, QuarryError, Result};
pub use llm::{
    ChatMessage, Decision, LLMClient, MetricsSnapshot, OpenAIClient, Role, ToolCallRequest,
    ToolSpec,
};
pub use search::{
    AdapterError, ClusterInfo, ElasticsearchClient, FullTextQuery, Hit, MemoryIndex,
    SearchAdapter, SearchFailure, SearchIndex, SearchOutcome, SearchReport, SearchResponse,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "quarry";

/// Name of the single tool the agent may call
pub const SEARCH_TOOL_NAME: &str = "search";
