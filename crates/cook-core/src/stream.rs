//! Structured event stream emitted by the execution agent in
//! `--output-format stream-json` mode.
//!
//! Shares the content schema of the transcript records in [`crate::transcript`].

use serde::Deserialize;

use crate::session::Message;
use crate::transcript::{ContentBlock, MessageBody, MessageContent};

/// Placeholder returned when a run produced no assistant text at all.
pub const NO_TEXT_RESPONSE: &str = "[no text response]";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// One decoded line of the agent's event stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Session initialisation and other system notices.
    System {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        model: Option<String>,
    },
    Assistant {
        #[serde(default)]
        message: MessageBody,
    },
    /// Tool results are echoed back as user turns.
    User {
        #[serde(default)]
        message: MessageBody,
    },
    ToolResult {
        #[serde(default)]
        content: MessageContent,
    },
    /// Terminal summary of the run.
    Result {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        total_cost_usd: f64,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        result: Option<String>,
    },
    Error {
        #[serde(default)]
        error: ErrorBody,
    },
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Tool result payloads carried by this event, if any.
    pub fn tool_results(&self) -> Vec<MessageContent> {
        match self {
            StreamEvent::ToolResult { content } => vec![content.clone()],
            StreamEvent::User { message } => message
                .content
                .blocks()
                .into_iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult { content } => Some(content),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Decodes one stream line. Undecodable lines yield `None`.
pub fn decode_stream_event(line: &str) -> Option<StreamEvent> {
    serde_json::from_str(line.trim()).ok()
}

/// Accumulates the assistant's text across a streamed run.
#[derive(Debug, Default)]
pub struct StreamCollector {
    buffer: String,
}

impl StreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Assistant { message } => {
                for text in message.content.text_parts() {
                    self.buffer.push_str(&text);
                    self.buffer.push('\n');
                }
            }
            // The terminal result text only stands in when nothing else was said.
            StreamEvent::Result {
                result: Some(result),
                ..
            } if !result.is_empty() && self.buffer.is_empty() => {
                self.buffer = result.clone();
            }
            _ => {}
        }
    }

    /// Returns the captured text, or [`NO_TEXT_RESPONSE`] when empty.
    pub fn finish(self) -> String {
        let trimmed = self.buffer.trim();
        if trimmed.is_empty() {
            NO_TEXT_RESPONSE.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// Picks the final response of a run.
///
/// The transcript's last record wins when it is an assistant message longer
/// than what the stream delivered. Longer is taken to mean more complete.
pub fn reconcile(captured: String, transcript_last: Option<&Message>) -> String {
    match transcript_last {
        Some(last) if last.is_assistant() && last.text.chars().count() > captured.chars().count() => {
            last.text.clone()
        }
        _ => captured,
    }
}
