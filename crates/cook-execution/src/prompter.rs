use async_trait::async_trait;

/// Outcome of asking the human for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// End of input (Ctrl-D or closed stdin).
    Eof,
}

/// Source of interactive input.
#[async_trait]
pub trait Prompter: Send {
    async fn read_line(&mut self, prompt: &str) -> PromptInput;
}
