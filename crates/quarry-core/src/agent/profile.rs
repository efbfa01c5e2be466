//! Instruction profiles for the three generation passes
//!
//! A profile pairs a system instruction with a capability. `TextOnly`
//! profiles can only produce text; `WithTools` is the one profile that binds
//! the tool contract and may yield tool calls.

use crate::config::CollectionRegistry;
use crate::error::Result;
use crate::llm::{ChatMessage, Decision, LLMClient, ToolSpec};
use std::time::Instant;

/// Capability marker: no tools bound
#[derive(Debug, Clone)]
pub struct TextOnly;

/// Capability marker: tools bound
#[derive(Debug, Clone)]
pub struct WithTools(pub Vec<ToolSpec>);

#[derive(Debug, Clone)]
pub struct Profile<C> {
    name: &'static str,
    instructions: String,
    capability: C,
}

impl<C> Profile<C> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// The instruction as a system message, followed by the history
    fn messages(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(self.instructions.as_str()))
            .chain(history.iter().cloned())
            .collect()
    }
}

impl Profile<TextOnly> {
    pub async fn complete(&self, llm: &dyn LLMClient, history: &[ChatMessage]) -> Result<String> {
        let start = Instant::now();
        let text = llm.chat_completion(self.messages(history)).await?;
        tracing::info!(
            "{} pass completed in {:.2}s",
            self.name,
            start.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}

impl Profile<WithTools> {
    pub fn tools(&self) -> &[ToolSpec] {
        &self.capability.0
    }

    pub async fn decide(&self, llm: &dyn LLMClient, history: &[ChatMessage]) -> Result<Decision> {
        let start = Instant::now();
        let decision = llm
            .chat_with_tools(self.messages(history), &self.capability.0)
            .await?;
        tracing::info!(
            "{} pass completed in {:.2}s ({} tool calls)",
            self.name,
            start.elapsed().as_secs_f64(),
            decision.tool_calls.len()
        );
        Ok(decision)
    }
}

/// Planning pass, listing the configured collections
pub fn rationale_profile(registry: &CollectionRegistry) -> Profile<TextOnly> {
    let collections = if registry.is_empty() {
        "(no collections configured)".to_string()
    } else {
        registry.describe().join("\n   - ")
    };

    Profile {
        name: "rationale",
        instructions: format!(
            "You are an assistant that finds information by searching an Elasticsearch \
document index.

## Tool
- **search**: keyword search over one collection
   Available collections:
   - {collections}

## Response format

### Thinking
[State the search plan in one or two sentences]

If the conversation already holds the information needed, say so instead of \
planning a new search."
        ),
        capability: TextOnly,
    }
}

/// Tool-bound pass that turns the plan into at most one call
pub fn decision_profile(tools: Vec<ToolSpec>) -> Profile<WithTools> {
    Profile {
        name: "decision",
        instructions: "Based on the previous Thinking, call the appropriate tool. Call the tool \
only, without a text response. Propose at most one tool call. If the conversation already \
contains the results needed to answer, call no tool."
            .to_string(),
        capability: WithTools(tools),
    }
}

/// Final answer pass over the search results
pub fn answer_profile() -> Profile<TextOnly> {
    Profile {
        name: "answer",
        instructions: "Give the user an accurate, structured answer based on the search results \
in the conversation.

Always follow this Markdown layout:

### Summary
- Found N results in total

### Details
[Present the results in a structured way]
- Records: list each field clearly (model, system, problem, cause, remedy)
- Documents: summarize the main points as bullet points

### Conclusion
[An overall answer grounded in the search results]

### Related questions
[Suggest three specific follow-up questions the user may have]
1. [Question 1]
2. [Question 2]
3. [Question 3]

If a search failed, explain what went wrong instead of inventing results. Answer in the \
language of the user's question."
            .to_string(),
        capability: TextOnly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::search_tool_spec;

    #[test]
    fn test_rationale_lists_collections() {
        let registry = CollectionRegistry::from_json(
            r#"{
                "vehicle_issues": {
                    "search_fields": ["model"],
                    "display_name": "Vehicle issues",
                    "description": "Known defects"
                },
                "documents": {"search_fields": ["title"], "description": "Manuals"}
            }"#,
        )
        .unwrap();
        let profile = rationale_profile(&registry);
        assert!(profile
            .instructions()
            .contains("- \"vehicle_issues\" (Vehicle issues): Known defects\n   - \"documents\""));
    }

    #[test]
    fn test_rationale_without_collections() {
        let profile = rationale_profile(&CollectionRegistry::empty());
        assert!(profile.instructions().contains("(no collections configured)"));
    }

    #[test]
    fn test_system_message_leads_history() {
        let profile = answer_profile();
        let messages = profile.messages(&[ChatMessage::user("q")]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, crate::llm::Role::System);
        assert_eq!(messages[1].content_text(), "q");
    }

    #[test]
    fn test_decision_profile_binds_tools() {
        let profile = decision_profile(vec![search_tool_spec()]);
        assert_eq!(profile.tools().len(), 1);
        assert_eq!(profile.name(), "decision");
    }
}
