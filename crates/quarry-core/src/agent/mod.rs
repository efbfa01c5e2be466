//! Conversational retrieval agent
//!
//! Provides:
//! - The append-only `Conversation` log shared between loop iterations
//! - The loop state machine and the `ReactAgent` that drives it
//! - Tool dispatch for the `search` tool
//! - In-memory sessions keyed by thread id
//! - An answer cache for thread-opening questions

mod cache;
mod conversation;
mod profile;
mod react;
mod session;
mod state;
pub mod tools;

pub use cache::{CacheStats, ResponseCache, DEFAULT_CACHE_TTL};
pub use conversation::{Conversation, Entry, EntryKind, ToolInvocation};
pub use profile::{Profile, TextOnly, WithTools};
pub use react::{ReactAgent, TurnOutcome, DEFAULT_MAX_ITERATIONS};
pub use session::{SessionStore, ThreadSummary};
pub use state::{LoopEvent, LoopState};
pub use tools::{SearchArgs, ToolDispatcher, ToolOutput};
