//! Conversation message types.
//!
//! This module contains types for representing messages observed in an
//! execution-agent session, including roles and tool invocations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    /// Message from the user (or from the director, relayed as user input).
    User,
    /// Message from the execution agent.
    Assistant,
}

/// A single structured tool call made by the execution agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name as reported by the agent (e.g. `Bash`, `Edit`).
    pub name: String,
    /// Tool arguments, usually a JSON object.
    #[serde(rename = "input")]
    pub arguments: Value,
}

/// A single message in a conversation history.
///
/// `tool_invocations` is `None` when the record carried no tool blocks at all,
/// so callers can tell "no tools" apart from a tool list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub text: String,
    /// Timestamp as reported by the producer (ISO 8601 when available).
    pub timestamp: String,
    /// Tool calls in the order they appeared.
    pub tool_invocations: Option<Vec<ToolInvocation>>,
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_invocations: None,
        }
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_invocations: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Iterates tool invocations, empty when there are none.
    pub fn tools(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.tool_invocations.iter().flatten()
    }
}

/// Append-only conversation owned by the session loop.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    /// Text of the most recent assistant message, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
