pub mod paths;
pub mod storage;
pub mod transcript_locator;
pub mod transcript_tail;

pub use paths::{CookPaths, PathError, resolve_agent_binary};
pub use storage::{SecretStorage, SettingsStorage};
pub use transcript_locator::TranscriptLocator;
pub use transcript_tail::{TranscriptTail, read_last_message};
