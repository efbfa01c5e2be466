//! Append-only conversation log
//!
//! The conversation is the only channel between loop iterations. Entries are
//! never mutated or reordered once appended, and every tool call must be
//! answered by exactly one tool result before a final answer or a new user
//! message may follow.

use crate::error::{FailureKind, QuarryError, Result};
use crate::llm::{ChatMessage, ToolCallRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

const TITLE_CHARS: usize = 50;

/// A tool call as recorded in the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    /// Correlation id linking the call to its result
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl From<ToolCallRequest> for ToolInvocation {
    fn from(call: ToolCallRequest) -> Self {
        Self {
            id: call.id,
            name: call.name,
            arguments: call.arguments,
        }
    }
}

impl From<&ToolInvocation> for ToolCallRequest {
    fn from(call: &ToolInvocation) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    User {
        content: String,
    },
    /// Rationale from the reasoning pass
    Thinking {
        content: String,
    },
    ToolCall {
        call: ToolInvocation,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        /// Short block naming the tool and its parameters
        summary: String,
        /// Tool output; failures start with `Error:`
        content: String,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<FailureKind>,
    },
    Final {
        content: String,
    },
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Thinking { .. } => "thinking",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Final { .. } => "final",
        }
    }

    /// Readable text of the entry; tool calls have none
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Thinking { content } | Self::Final { content } => {
                Some(content)
            }
            Self::ToolResult { content, .. } => Some(content),
            Self::ToolCall { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Position in the conversation, starting at 0
    pub ordinal: usize,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    id: String,
    created_at: DateTime<Utc>,
    entries: Vec<Entry>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// First user message, cut to a short title
    pub fn title(&self) -> Option<String> {
        self.entries.iter().find_map(|entry| match &entry.kind {
            EntryKind::User { content } => Some(match content.char_indices().nth(TITLE_CHARS) {
                Some((idx, _)) => format!("{}...", &content[..idx]),
                None => content.clone(),
            }),
            _ => None,
        })
    }

    /// Tool calls that have no result yet, in call order
    pub fn pending_calls(&self) -> Vec<&ToolInvocation> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.kind {
                EntryKind::ToolCall { call } if !self.has_result(&call.id) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn has_call(&self, call_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(&e.kind, EntryKind::ToolCall { call } if call.id == call_id))
    }

    fn has_result(&self, call_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(&e.kind, EntryKind::ToolResult { call_id: id, .. } if id == call_id))
    }

    fn ensure_no_pending(&self, what: &str) -> Result<()> {
        let pending = self.pending_calls();
        if pending.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = pending.iter().map(|c| c.id.as_str()).collect();
        Err(QuarryError::Conversation(format!(
            "cannot append {} while tool calls are unanswered: {}",
            what,
            ids.join(", ")
        )))
    }

    fn append(&mut self, kind: EntryKind) -> usize {
        let ordinal = self.entries.len();
        self.entries.push(Entry {
            ordinal,
            created_at: Utc::now(),
            kind,
        });
        ordinal
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> Result<usize> {
        self.ensure_no_pending("a user message")?;
        Ok(self.append(EntryKind::User {
            content: content.into(),
        }))
    }

    pub fn push_thinking(&mut self, content: impl Into<String>) -> usize {
        self.append(EntryKind::Thinking {
            content: content.into(),
        })
    }

    pub fn push_tool_call(&mut self, call: ToolInvocation) -> Result<usize> {
        if self.has_call(&call.id) {
            return Err(QuarryError::Conversation(format!(
                "duplicate tool call id: {}",
                call.id
            )));
        }
        Ok(self.append(EntryKind::ToolCall { call }))
    }

    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
        duration_ms: u64,
        failure: Option<FailureKind>,
    ) -> Result<usize> {
        let call_id = call_id.into();
        let tool_name = self
            .pending_calls()
            .into_iter()
            .find(|c| c.id == call_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| {
                QuarryError::Conversation(format!("no pending tool call with id {}", call_id))
            })?;

        Ok(self.append(EntryKind::ToolResult {
            call_id,
            tool_name,
            summary: summary.into(),
            content: content.into(),
            duration_ms,
            failure,
        }))
    }

    pub fn push_final(&mut self, content: impl Into<String>) -> Result<usize> {
        self.ensure_no_pending("a final answer")?;
        Ok(self.append(EntryKind::Final {
            content: content.into(),
        }))
    }

    /// Non-system chat history for the generation service.
    ///
    /// Consecutive tool calls collapse into one assistant message so the
    /// following tool messages answer it.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            match &entry.kind {
                EntryKind::User { content } => messages.push(ChatMessage::user(content.as_str())),
                EntryKind::Thinking { content } | EntryKind::Final { content } => {
                    messages.push(ChatMessage::assistant(content.as_str()))
                }
                EntryKind::ToolCall { call } => match messages.last_mut() {
                    Some(last) if !last.tool_calls.is_empty() => last.tool_calls.push(call.into()),
                    _ => messages.push(ChatMessage::tool_calls(vec![call.into()])),
                },
                EntryKind::ToolResult {
                    call_id,
                    summary,
                    content,
                    ..
                } => messages.push(ChatMessage::tool_result(
                    call_id.as_str(),
                    format!("{}{}", summary, content),
                )),
            }
        }

        messages
    }

    /// Entries from `ordinal` onward
    pub fn since(&self, ordinal: usize) -> &[Entry] {
        self.entries.get(ordinal..).unwrap_or(&[])
    }

    /// Ordinals of entries whose text contains `term`, ignoring case.
    /// A blank term matches nothing.
    pub fn find(&self, term: &str) -> Vec<usize> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .kind
                    .text()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
            .map(|entry| entry.ordinal)
            .collect()
    }
}
