//! Reasoning/action loop states

use crate::error::{QuarryError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    AwaitingInput,
    Thinking,
    ProposingTool,
    Answering,
    AwaitingToolResult,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// A user entry was appended
    UserInput,
    /// The decision pass proposed at least one tool call
    ToolProposed,
    /// The decision pass proposed nothing
    NoToolProposed,
    /// Tool calls were handed to the dispatcher
    Dispatched,
    /// Every dispatched call has its result appended
    ResultsAppended,
    /// The final answer was appended
    Answered,
}

impl LoopState {
    /// Apply an event, rejecting transitions the loop never makes
    pub fn advance(self, event: LoopEvent) -> Result<Self> {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self, event) {
            (AwaitingInput, UserInput) => Thinking,
            (Thinking, ToolProposed) => ProposingTool,
            (Thinking, NoToolProposed) => Answering,
            (ProposingTool, Dispatched) => AwaitingToolResult,
            (AwaitingToolResult, ResultsAppended) => Thinking,
            (Answering, Answered) => Done,
            (state, event) => {
                return Err(QuarryError::Conversation(format!(
                    "invalid loop transition: {:?} in state {}",
                    event, state
                )))
            }
        };

        tracing::debug!("Loop state {} -> {}", self, next);
        Ok(next)
    }

    pub fn is_terminal(self) -> bool {
        self == LoopState::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingInput => "awaiting_input",
            Self::Thinking => "thinking",
            Self::ProposingTool => "proposing_tool",
            Self::Answering => "answering",
            Self::AwaitingToolResult => "awaiting_tool_result",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
