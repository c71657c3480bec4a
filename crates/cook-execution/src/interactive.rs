/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveCommand {
    /// Blank input, ignored.
    Empty,
    /// `/quit`
    Quit,
    /// `/auto`: hand control back to the director.
    Auto,
    /// Anything else is sent to the agent.
    Say(String),
}

impl InteractiveCommand {
    pub const AUTO: &'static str = "/auto";
    pub const QUIT: &'static str = "/quit";

    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => InteractiveCommand::Empty,
            Self::QUIT => InteractiveCommand::Quit,
            Self::AUTO => InteractiveCommand::Auto,
            text => InteractiveCommand::Say(text.to_string()),
        }
    }
}
