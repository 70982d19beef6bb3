//! Conversation state.
//!
//! An explicit, caller-owned turn log passed into each orchestrator turn.
//! Append-only while in use; the caller clears it explicitly. Keeping it out
//! of ambient globals is what makes concurrent sessions and tests possible.

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Explicit reset; the only way turns are ever removed.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Project the log into provider chat messages.
    pub fn as_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_append_in_order() {
        let mut conversation = Conversation::new();
        conversation.push(Role::User, "hello");
        conversation.push(Role::Assistant, "hi");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[0].role, Role::User);
        assert_eq!(conversation.turns()[1].content, "hi");
    }

    #[test]
    fn clear_is_explicit() {
        let mut conversation = Conversation::new();
        conversation.push(Role::User, "hello");
        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn messages_mirror_turns() {
        let mut conversation = Conversation::new();
        conversation.push(Role::System, "be brief");
        conversation.push(Role::User, "hello");

        let messages = conversation.as_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "hello");
    }
}
