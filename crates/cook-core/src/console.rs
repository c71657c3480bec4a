//! Line-oriented console rendering.
//!
//! All human-facing output goes through a [`Console`] built once at startup
//! and handed to every component, so colours live in one explicit value.

use colored::{Color, ColoredString, Colorize};

use crate::session::{Message, Role};
use crate::stream::StreamEvent;
use crate::text::{preview, truncate_chars};

const RULE_WIDTH: usize = 60;

/// Colour assignments for each kind of output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub agent: Color,
    pub cook: Color,
    pub tool: Color,
    pub result: Color,
    pub success: Color,
    pub error: Color,
    pub info: Color,
    pub user: Color,
    pub warn: Color,
    pub accent: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            agent: Color::TrueColor { r: 175, g: 135, b: 255 },
            cook: Color::TrueColor { r: 255, g: 135, b: 0 },
            tool: Color::TrueColor { r: 0, g: 175, b: 255 },
            result: Color::TrueColor { r: 138, g: 138, b: 138 },
            success: Color::TrueColor { r: 95, g: 255, b: 0 },
            error: Color::TrueColor { r: 255, g: 0, b: 0 },
            info: Color::TrueColor { r: 168, g: 168, b: 168 },
            user: Color::Green,
            warn: Color::Yellow,
            accent: Color::Cyan,
        }
    }
}

/// Renders agent, director and loop output to stdout.
#[derive(Debug, Clone, Default)]
pub struct Console {
    palette: Palette,
}

impl Console {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn tag(&self, label: &str, color: Color) -> ColoredString {
        label.color(color).bold()
    }

    // ------------------------------------------------------------------
    // Stream rendering
    // ------------------------------------------------------------------

    /// Formats one stream event into display lines.
    pub fn format_stream_event(&self, event: &StreamEvent) -> Vec<String> {
        let p = &self.palette;
        match event {
            StreamEvent::System { subtype, model } if subtype == "init" => {
                let model = model.as_deref().unwrap_or("unknown");
                vec![format!("[init] model={model}").dimmed().to_string()]
            }
            StreamEvent::System { .. } | StreamEvent::Unknown => Vec::new(),
            StreamEvent::Assistant { message } => {
                let mut lines = Vec::new();
                for block in message.content.blocks() {
                    match block {
                        crate::transcript::ContentBlock::Text { text } => lines.push(format!(
                            "{} {}",
                            self.tag("[claude]", p.agent),
                            text.color(p.agent)
                        )),
                        crate::transcript::ContentBlock::ToolUse { name, input } => {
                            let input = input.to_string();
                            lines.push(format!(
                                "{} {}{}",
                                "[tool]".color(p.tool),
                                name.color(p.tool).bold(),
                                format!(": {}", truncate_chars(&input, 150)).color(p.tool)
                            ));
                        }
                        _ => {}
                    }
                }
                lines
            }
            StreamEvent::User { .. } | StreamEvent::ToolResult { .. } => event
                .tool_results()
                .iter()
                .map(|content| {
                    let text = content.joined_text();
                    format!("[result] {}...", truncate_chars(&text, 300))
                        .color(p.result)
                        .to_string()
                })
                .collect(),
            StreamEvent::Result {
                subtype,
                total_cost_usd,
                duration_ms,
                ..
            } => {
                let color = if subtype == "success" { p.success } else { p.error };
                vec![
                    format!("[done] {subtype} | ${total_cost_usd:.4} | {duration_ms}ms")
                        .color(color)
                        .to_string(),
                ]
            }
            StreamEvent::Error { error } => {
                let message = error.message.as_deref().unwrap_or("Unknown");
                vec![format!("[error] {message}").color(p.error).to_string()]
            }
        }
    }

    pub fn stream_event(&self, event: &StreamEvent) {
        for line in self.format_stream_event(event) {
            println!("{line}");
        }
    }

    /// Echoes a stream line that could not be decoded.
    pub fn raw(&self, line: &str) {
        if !line.trim().is_empty() {
            println!("{}", format!("[raw] {}", truncate_chars(line, 200)).dimmed());
        }
    }

    // ------------------------------------------------------------------
    // Tailed transcript rendering
    // ------------------------------------------------------------------

    /// Formats a tailed transcript message into display lines.
    pub fn format_message(&self, message: &Message) -> Vec<String> {
        let p = &self.palette;
        match message.role {
            Role::User => {
                if message.text.is_empty() {
                    return Vec::new();
                }
                let flat = message.text.replace('\n', " ");
                vec![format!("{} {}", "[user]".color(p.user), preview(&flat, 100))]
            }
            Role::Assistant => {
                let mut lines: Vec<String> = message
                    .tools()
                    .map(|tool| format!("[tool] {}", tool.name).color(p.tool).to_string())
                    .collect();
                if !message.text.is_empty() {
                    let flat = message.text.replace('\n', " ");
                    lines.push(format!("{} {}", "[claude]".color(p.agent), preview(&flat, 200)));
                }
                lines
            }
        }
    }

    pub fn message(&self, message: &Message) {
        for line in self.format_message(message) {
            println!("{line}");
        }
    }

    // ------------------------------------------------------------------
    // Director and loop notices
    // ------------------------------------------------------------------

    pub fn cook(&self, text: &str) {
        println!("\n{} {}\n", self.tag("[cook]", self.palette.cook), text.color(self.palette.cook));
    }

    pub fn cook_auto(&self, text: &str) {
        println!(
            "\n{} {}\n",
            self.tag("[cook:auto]", self.palette.cook),
            text.color(self.palette.cook)
        );
    }

    /// A director notice that is not an instruction.
    pub fn cook_note(&self, text: &str) {
        println!("\n{} {}", "[cook]".color(self.palette.cook), text.color(self.palette.info));
    }

    pub fn info(&self, text: &str) {
        println!("{}", text.color(self.palette.info));
    }

    pub fn success(&self, text: &str) {
        println!("{}", text.color(self.palette.success));
    }

    pub fn warn(&self, text: &str) {
        println!("{}", text.color(self.palette.warn));
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", text.color(self.palette.error));
    }

    pub fn dim(&self, text: &str) {
        println!("{}", text.dimmed());
    }

    pub fn rule(&self) {
        println!("{}", "─".repeat(RULE_WIDTH).dimmed());
    }

    /// Framed heading followed by detail lines.
    pub fn banner(&self, title: &str, details: &[String], hint: &str) {
        let bar = "═".repeat(RULE_WIDTH);
        println!("\n{}", bar.color(self.palette.accent));
        println!("{}", format!("🍳 {title}").color(self.palette.accent));
        println!("{}", bar.color(self.palette.accent));
        for line in details {
            println!("{}", line.color(self.palette.info));
        }
        println!("\n{}", hint.dimmed());
        println!("{}\n", bar.color(self.palette.accent));
    }

    /// Heading shown when the human takes over.
    pub fn interactive_banner(&self) {
        let bar = "─".repeat(40);
        println!("\n{}", bar.color(self.palette.user));
        println!("{}", "INTERACTIVE MODE".color(self.palette.user));
        println!("{}", "/auto  - Resume autonomous mode".dimmed());
        println!("{}", "/quit  - Exit".dimmed());
        println!("{}\n", bar.color(self.palette.user));
    }
}
