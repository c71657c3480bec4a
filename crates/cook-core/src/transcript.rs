//! Transcript record decoding.
//!
//! The execution agent appends one JSON object per line to its session
//! transcript. Only `user` and `assistant` records become [`Message`]s; every
//! other record kind is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::session::{Message, Role, ToolInvocation};

/// Message content: either a bare string or a list of content blocks.
///
/// Blocks are kept as raw JSON so that one odd block cannot make the whole
/// record undecodable.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<Value>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Decodes the content blocks, skipping anything that is not a known block.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(values) => values
                .iter()
                .filter_map(|v| serde_json::from_value::<ContentBlock>(v.clone()).ok())
                .filter(|b| !matches!(b, ContentBlock::Other))
                .collect(),
        }
    }

    /// Text parts of the content, in order.
    pub fn text_parts(&self) -> Vec<String> {
        match self {
            MessageContent::Text(text) => vec![text.clone()],
            MessageContent::Blocks(_) => self
                .blocks()
                .into_iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Text parts joined with newlines.
    pub fn joined_text(&self) -> String {
        self.text_parts().join("\n")
    }

    /// Text of a user turn: text blocks plus the output of tool results, in order.
    pub fn user_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(_) => self
                .blocks()
                .into_iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text),
                    ContentBlock::ToolResult { content } => Some(content.joined_text()),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One content block inside a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default = "empty_object")]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        content: MessageContent,
    },
    #[serde(other)]
    Other,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Inner `message` object of a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub content: MessageContent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TranscriptRecord {
    User {
        #[serde(default)]
        message: MessageBody,
        #[serde(default)]
        timestamp: String,
    },
    Assistant {
        #[serde(default)]
        message: MessageBody,
        #[serde(default)]
        timestamp: String,
    },
    #[serde(other)]
    Other,
}

impl TranscriptRecord {
    fn into_message(self) -> Option<Message> {
        match self {
            TranscriptRecord::User { message, timestamp } => Some(Message {
                role: Role::User,
                text: message.content.user_text(),
                timestamp,
                tool_invocations: None,
            }),
            TranscriptRecord::Assistant { message, timestamp } => {
                let mut text_parts = Vec::new();
                let mut tools = Vec::new();

                match &message.content {
                    MessageContent::Text(text) => text_parts.push(text.clone()),
                    MessageContent::Blocks(_) => {
                        for block in message.content.blocks() {
                            match block {
                                ContentBlock::Text { text } => text_parts.push(text),
                                ContentBlock::ToolUse { name, input } => {
                                    tools.push(ToolInvocation {
                                        name,
                                        arguments: input,
                                    })
                                }
                                ContentBlock::ToolResult { .. } | ContentBlock::Other => {}
                            }
                        }
                    }
                }

                Some(Message {
                    role: Role::Assistant,
                    text: text_parts.join("\n"),
                    timestamp,
                    tool_invocations: if tools.is_empty() { None } else { Some(tools) },
                })
            }
            TranscriptRecord::Other => None,
        }
    }
}

/// Parses a single transcript line into a [`Message`].
///
/// Never fails: malformed lines and unknown record kinds yield `None`.
pub fn parse_line(line: &str) -> Option<Message> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<TranscriptRecord>(trimmed) {
        Ok(record) => record.into_message(),
        Err(err) => {
            tracing::debug!(error = %err, "Skipping undecodable transcript line");
            None
        }
    }
}
