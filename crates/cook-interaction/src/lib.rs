pub mod advisor;
pub mod director;
pub mod gemini_api_agent;
pub mod launcher;
pub mod local_agents;

pub use advisor::{Advisor, DisabledAdvisor};
pub use director::{Director, Sentinel, interpret};
pub use gemini_api_agent::{AdvisoryError, GeminiApiAgent};
pub use launcher::Launcher;
pub use local_agents::ClaudeCodeLauncher;
