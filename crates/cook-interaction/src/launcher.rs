use async_trait::async_trait;
use cook_core::CookError;

/// Starts execution-agent runs.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Runs one instruction to completion, rendering the agent's output as it
    /// streams, and returns the final response text.
    ///
    /// Dropping the future kills the agent process.
    async fn run(&self, instruction: &str, continue_prior: bool) -> Result<String, CookError>;

    /// Starts a run continuing the latest session and returns immediately.
    ///
    /// The process is reaped in the background; its outcome is only logged
    /// and its reply shows up in the transcript.
    fn spawn_detached(&self, instruction: &str) -> Result<(), CookError>;
}
