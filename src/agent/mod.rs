//! Orchestrator: the model-driven tool-dispatch loop.
//!
//! Each user turn runs an explicit state machine:
//! `Idle → Dispatching → ToolExecuting → Composing → Idle`, with `Failed`
//! terminal for the turn. The model picks tools by replying with a JSON
//! directive; tool failures become string observations fed back to it, and a
//! fixed step bound guarantees termination even when the model keeps asking
//! for tools. The turn result is always a displayable string.

pub mod tools;

use std::sync::Arc;

use serde_json::Value;

use crate::core::config::OrchestratorConfig;
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::session::{Conversation, Role};
use crate::store::VectorStore;

pub use tools::{DocumentQaTool, ReportAnalysisTool, Tool, ToolRegistry};

/// Phase of the per-turn state machine. Tracked explicitly so termination
/// behavior is observable and testable rather than buried in control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Dispatching,
    ToolExecuting,
    Composing,
    Failed,
}

enum Decision {
    Final(String),
    ToolCall { name: String, args: Value },
}

pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    store: Arc<dyn VectorStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ToolRegistry,
        store: Arc<dyn VectorStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            store,
            config,
        }
    }

    /// Run one user turn. The conversation gains exactly two turns: the
    /// user input and the assistant answer (which may be an error string).
    pub async fn run_turn(&self, conversation: &mut Conversation, input: &str) -> String {
        conversation.push(Role::User, input);
        let answer = self.drive(conversation, input).await;
        conversation.push(Role::Assistant, answer.clone());
        answer
    }

    async fn drive(&self, conversation: &Conversation, input: &str) -> String {
        let mut phase = TurnPhase::Idle;

        if self.registry.is_empty() {
            self.transition(&mut phase, TurnPhase::Failed);
            return "No tools are available to answer this request.".to_string();
        }
        match self.store.count().await {
            Ok(0) => {
                self.transition(&mut phase, TurnPhase::Failed);
                return "No documents have been indexed yet. Load a document first.".to_string();
            }
            Ok(_) => {}
            Err(err) => {
                self.transition(&mut phase, TurnPhase::Failed);
                tracing::warn!(error = %err, "store unavailable at turn start");
                return "The document index is unavailable right now.".to_string();
            }
        }

        let mut messages = vec![ChatMessage::system(self.instructions())];
        // Conversation already holds this turn's user input as its last entry.
        messages.extend(conversation.as_messages());

        for step in 0..self.config.max_steps {
            self.transition(&mut phase, TurnPhase::Dispatching);
            let response = match self.provider.chat(ChatRequest::new(messages.clone())).await {
                Ok(text) => text,
                Err(err) => {
                    self.transition(&mut phase, TurnPhase::Failed);
                    tracing::warn!(error = %err, step, "dispatch model call failed");
                    return format!("I couldn't process that request: {}", err);
                }
            };

            match parse_decision(&response) {
                Decision::Final(content) => {
                    self.transition(&mut phase, TurnPhase::Composing);
                    self.transition(&mut phase, TurnPhase::Idle);
                    return content;
                }
                Decision::ToolCall { name, args } => {
                    self.transition(&mut phase, TurnPhase::ToolExecuting);
                    let observation = self.execute_tool(&name, &args).await;
                    tracing::debug!(tool = %name, step, "tool observation recorded");
                    messages.push(ChatMessage::system(observation));
                }
            }
        }

        // Step bound hit: one last composing call for a best-effort answer.
        self.transition(&mut phase, TurnPhase::Composing);
        messages.push(ChatMessage::system(
            "You have used the maximum number of tool calls. Give your best final \
             answer now from the observations above, as plain text.",
        ));
        match self.provider.chat(ChatRequest::new(messages)).await {
            Ok(text) => {
                self.transition(&mut phase, TurnPhase::Idle);
                strip_directive(&text).unwrap_or(text)
            }
            Err(err) => {
                self.transition(&mut phase, TurnPhase::Failed);
                tracing::warn!(error = %err, "best-effort compose failed");
                format!(
                    "Reached the maximum number of reasoning steps ({}) without a final answer. Question: {}",
                    self.config.max_steps, input
                )
            }
        }
    }

    /// Every tool failure is converted to a string observation; the loop
    /// never aborts on a single tool error.
    async fn execute_tool(&self, name: &str, args: &Value) -> String {
        let Some(tool) = self.registry.get(name) else {
            return format!(
                "Tool `{}` is not available. Available tools: {}",
                name,
                self.registry.names().join(", ")
            );
        };

        match tool.call(args).await {
            Ok(result) => format!("Tool `{}` result:\n{}", name, result),
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "tool execution failed");
                format!("Tool `{}` failed: {}", name, err)
            }
        }
    }

    fn transition(&self, phase: &mut TurnPhase, next: TurnPhase) {
        tracing::trace!(from = ?phase, to = ?next, "turn phase transition");
        *phase = next;
    }

    fn instructions(&self) -> String {
        format!(
            "You answer questions about loaded documents.\n\
             You have access to the following tools:\n{}\n\
             When you need a tool, respond ONLY with JSON in this format:\n\
             {{\"type\":\"tool_call\",\"tool_name\":\"<tool>\",\"tool_args\":{{...}}}}\n\
             When you have the final answer, respond ONLY with JSON in this format:\n\
             {{\"type\":\"final\",\"content\":\"...\"}}\n\
             Do not include any extra text outside the JSON.",
            self.registry.describe()
        )
    }
}

fn parse_decision(text: &str) -> Decision {
    if let Some(value) = extract_json(text) {
        if let Some(decision) = decision_from_value(&value) {
            return decision;
        }
    }
    // A model that ignores the protocol is answering directly.
    Decision::Final(text.trim().to_string())
}

fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
}

fn decision_from_value(value: &Value) -> Option<Decision> {
    let action = value
        .get("type")
        .or_else(|| value.get("action"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if action == "tool_call" {
        let name = value
            .get("tool_name")
            .or_else(|| value.get("name"))
            .or_else(|| value.get("tool"))
            .and_then(|v| v.as_str())?;
        let args = value
            .get("tool_args")
            .or_else(|| value.get("args"))
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        return Some(Decision::ToolCall {
            name: name.to_string(),
            args,
        });
    }

    if action == "final" {
        let content = value
            .get("content")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        return Some(Decision::Final(content));
    }

    None
}

/// If a best-effort answer still came wrapped in a final directive, unwrap it.
fn strip_directive(text: &str) -> Option<String> {
    let value = extract_json(text)?;
    match decision_from_value(&value)? {
        Decision::Final(content) if !content.is_empty() => Some(content),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_final_answer() {
        match parse_decision("Robots are machines.") {
            Decision::Final(content) => assert_eq!(content, "Robots are machines."),
            Decision::ToolCall { .. } => panic!("expected final"),
        }
    }

    #[test]
    fn tool_call_json_is_parsed() {
        let response = r#"{"type":"tool_call","tool_name":"document_qa","tool_args":{"query":"sensors"}}"#;
        match parse_decision(response) {
            Decision::ToolCall { name, args } => {
                assert_eq!(name, "document_qa");
                assert_eq!(args["query"], "sensors");
            }
            Decision::Final(_) => panic!("expected tool call"),
        }
    }

    #[test]
    fn embedded_json_is_extracted() {
        let response = "Sure, calling a tool:\n{\"type\":\"final\",\"content\":\"done\"}\nthanks";
        match parse_decision(response) {
            Decision::Final(content) => assert_eq!(content, "done"),
            Decision::ToolCall { .. } => panic!("expected final"),
        }
    }

    #[test]
    fn tool_call_without_name_falls_back_to_final() {
        let response = r#"{"type":"tool_call","tool_args":{}}"#;
        match parse_decision(response) {
            Decision::Final(content) => assert!(content.contains("tool_call")),
            Decision::ToolCall { .. } => panic!("expected fallback to final"),
        }
    }

    #[test]
    fn directive_wrapped_answer_is_unwrapped() {
        let text = r#"{"type":"final","content":"the answer"}"#;
        assert_eq!(strip_directive(text).as_deref(), Some("the answer"));
        assert!(strip_directive("plain text").is_none());
    }
}
