//! Line editor for interactive mode.
//!
//! rustyline blocks, so the editor lives on its own thread and answers line
//! requests from the session loop over channels.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use colored::Colorize;
use cook_execution::{InteractiveCommand, PromptInput, Prompter};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::oneshot;

/// Completion, highlighting and hints for the slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                InteractiveCommand::AUTO.to_string(),
                InteractiveCommand::QUIT.to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Owned(prompt.green().bold().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

struct LineRequest {
    prompt: String,
    reply: oneshot::Sender<PromptInput>,
}

/// [`Prompter`] backed by a rustyline editor thread.
pub struct ReadlinePrompter {
    requests: mpsc::Sender<LineRequest>,
}

impl ReadlinePrompter {
    /// Starts the editor thread and waits until the terminal is ready.
    pub fn spawn() -> anyhow::Result<Self> {
        let (requests, incoming) = mpsc::channel::<LineRequest>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);

        thread::Builder::new()
            .name("cook-readline".to_string())
            .spawn(move || {
                let mut editor: Editor<CliHelper, DefaultHistory> = match Editor::new() {
                    Ok(editor) => editor,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                editor.set_helper(Some(CliHelper::new()));
                let _ = ready_tx.send(Ok(()));

                for request in incoming {
                    let input = read_one(&mut editor, &request.prompt);
                    if request.reply.send(input).is_err() {
                        break;
                    }
                }
                log::debug!("Readline thread stopped");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { requests }),
            Ok(Err(e)) => anyhow::bail!("Cannot start line editor: {e}"),
            Err(_) => anyhow::bail!("Line editor thread exited during startup"),
        }
    }
}

fn read_one(editor: &mut Editor<CliHelper, DefaultHistory>, prompt: &str) -> PromptInput {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            PromptInput::Line(line)
        }
        Err(ReadlineError::Interrupted) => PromptInput::Interrupted,
        Err(ReadlineError::Eof) => PromptInput::Eof,
        Err(err) => {
            log::error!("Readline failed: {err:?}");
            PromptInput::Eof
        }
    }
}

#[async_trait]
impl Prompter for ReadlinePrompter {
    async fn read_line(&mut self, prompt: &str) -> PromptInput {
        let (reply, response) = oneshot::channel();
        let request = LineRequest {
            prompt: prompt.to_string(),
            reply,
        };
        if self.requests.send(request).is_err() {
            return PromptInput::Eof;
        }
        response.await.unwrap_or(PromptInput::Eof)
    }
}
