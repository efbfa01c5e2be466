//! Reasoning/action loop
//!
//! Each iteration runs a rationale pass (no tools) and then a decision pass
//! with the tool contract bound. A proposed call keeps the rationale, records
//! the call, dispatches it and loops. No proposal discards the rationale and
//! runs the answer pass, which ends the turn.
//!
//! When a cache is attached, a thread-opening question that was answered
//! before skips the loop and replays the stored answer.

use super::cache::ResponseCache;
use super::conversation::{Conversation, Entry, ToolInvocation};
use super::profile::{
    answer_profile, decision_profile, rationale_profile, Profile, TextOnly, WithTools,
};
use super::state::{LoopEvent, LoopState};
use super::tools::ToolDispatcher;
use crate::config::CollectionRegistry;
use crate::error::{QuarryError, Result};
use crate::llm::{ChatMessage, LLMClient};
use crate::search::SearchAdapter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Iterations allowed per turn when not configured
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Summary of one completed turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    /// Reasoning iterations used (rationale + decision passes)
    pub iterations: usize,
    pub tool_calls: usize,
    /// Every state the loop passed through, in order
    pub states: Vec<LoopState>,
    /// Ordinal of the user entry that opened the turn
    pub first_entry: usize,
    /// The answer was replayed from the response cache
    pub cached: bool,
}

impl TurnOutcome {
    /// Entries appended during this turn
    pub fn entries<'a>(&self, conversation: &'a Conversation) -> &'a [Entry] {
        conversation.since(self.first_entry)
    }
}

pub struct ReactAgent {
    llm: Arc<dyn LLMClient>,
    dispatcher: ToolDispatcher,
    rationale: Profile<TextOnly>,
    decision: Profile<WithTools>,
    answer: Profile<TextOnly>,
    max_iterations: usize,
    cache: Option<Arc<ResponseCache>>,
}

impl ReactAgent {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        adapter: Arc<SearchAdapter>,
        registry: &CollectionRegistry,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(adapter);
        let decision = decision_profile(dispatcher.specs());

        Self {
            llm,
            dispatcher,
            rationale: rationale_profile(registry),
            decision,
            answer: answer_profile(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Run one turn: append the user message and loop until a final answer.
    ///
    /// Generation failures end the turn with `Err`; tool failures never do.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_input: &str,
    ) -> Result<TurnOutcome> {
        let turn_start = Instant::now();
        let cache = self.cache.as_deref().filter(|_| conversation.is_empty());
        let first_entry = conversation.push_user(user_input)?;

        let mut states = vec![LoopState::AwaitingInput];
        advance(&mut states, LoopEvent::UserInput)?;

        if let Some(answer) = cache.and_then(|cache| cache.get(user_input)) {
            tracing::info!("Answer served from cache for thread {}", conversation.id());
            advance(&mut states, LoopEvent::NoToolProposed)?;
            conversation.push_final(answer.as_str())?;
            advance(&mut states, LoopEvent::Answered)?;

            return Ok(TurnOutcome {
                answer,
                iterations: 0,
                tool_calls: 0,
                states,
                first_entry,
                cached: true,
            });
        }

        let mut iterations = 0;
        let mut tool_calls = 0;

        loop {
            if iterations >= self.max_iterations {
                tracing::warn!(
                    "Turn on thread {} aborted after {} iterations",
                    conversation.id(),
                    iterations
                );
                return Err(QuarryError::TurnAborted { iterations });
            }
            iterations += 1;
            tracing::info!("Starting thinking phase (iteration {})", iterations);

            let history = conversation.to_messages();
            let rationale = self.rationale.complete(self.llm.as_ref(), &history).await?;

            let mut with_rationale = history;
            with_rationale.push(ChatMessage::assistant(rationale.as_str()));
            let decision = self.decision.decide(self.llm.as_ref(), &with_rationale).await?;

            if !decision.has_tool_calls() {
                advance(&mut states, LoopEvent::NoToolProposed)?;
                tracing::info!("No tool proposed, generating final answer");

                let answer = self
                    .answer
                    .complete(self.llm.as_ref(), &conversation.to_messages())
                    .await?;
                conversation.push_final(answer.as_str())?;
                advance(&mut states, LoopEvent::Answered)?;
                if let Some(cache) = cache {
                    cache.insert(user_input, answer.as_str());
                }

                tracing::info!(
                    "Turn completed in {:.2}s ({} iterations, {} tool calls)",
                    turn_start.elapsed().as_secs_f64(),
                    iterations,
                    tool_calls
                );

                return Ok(TurnOutcome {
                    answer,
                    iterations,
                    tool_calls,
                    states,
                    first_entry,
                    cached: false,
                });
            }

            advance(&mut states, LoopEvent::ToolProposed)?;
            if decision.tool_calls.len() > 1 {
                tracing::warn!(
                    "Decision proposed {} tool calls; executing in order",
                    decision.tool_calls.len()
                );
            }

            conversation.push_thinking(rationale);
            let mut calls = Vec::with_capacity(decision.tool_calls.len());
            for call in decision.tool_calls {
                let mut call = ToolInvocation::from(call);
                if call.id.is_empty() || conversation.has_call(&call.id) {
                    call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                }
                conversation.push_tool_call(call.clone())?;
                calls.push(call);
            }
            advance(&mut states, LoopEvent::Dispatched)?;

            for call in &calls {
                let output = self.dispatcher.dispatch(call).await;
                conversation.push_tool_result(
                    output.call_id,
                    output.summary,
                    output.content,
                    output.duration_ms,
                    output.failure,
                )?;
                tool_calls += 1;
            }
            advance(&mut states, LoopEvent::ResultsAppended)?;
        }
    }
}

/// Apply `event` to the latest state and record the result
fn advance(states: &mut Vec<LoopState>, event: LoopEvent) -> Result<()> {
    let current = states.last().copied().unwrap_or(LoopState::AwaitingInput);
    states.push(current.advance(event)?);
    Ok(())
}
