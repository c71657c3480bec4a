pub mod config;
pub mod console;
pub mod error;
pub mod session;
pub mod stream;
pub mod text;
pub mod transcript;

// Re-export common error type
pub use error::{CookError, Result};

pub use config::{RunConfig, RunMode, Settings, Timing};
pub use console::{Console, Palette};
pub use session::{Conversation, Message, Role, ToolInvocation};
