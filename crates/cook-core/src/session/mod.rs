//! Session domain types.

pub mod message;

pub use message::{Conversation, Message, Role, ToolInvocation};
