//! The session loop: drives, watches, or hands control to the human.
//!
//! ```text
//!            task given              tailing flag             neither
//!               │                        │                       │
//!               ▼                        ▼                       ▼
//!            Drive ◄──── /auto ───── Interactive ◄── Ctrl-C ── Tail
//!               │  ──── decline ────►    │                (Locating → Replaying → Tailing)
//!               │  ──── Ctrl-C ─────►    │
//!               │  ──── turn limit ─►    ▼
//!               │                    Finished (/quit, EOF)
//! ```
//!
//! One cooperative task runs the whole loop. Every suspension point (sleeps,
//! advisor calls, agent runs) is raced against the [`InterruptHandle`].

use cook_core::{Console, Conversation, Message, Result, RunConfig, RunMode};
use cook_infrastructure::{TranscriptLocator, TranscriptTail};
use cook_interaction::{Director, Launcher};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::interactive::InteractiveCommand;
use crate::interrupt::InterruptHandle;
use crate::prompter::{PromptInput, Prompter};
use crate::turn_budget::TurnBudget;

const PROMPT: &str = "[you] ";

/// What the loop does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Director-driven runs. `initial` is sent first as a fresh session.
    Drive {
        initial: Option<String>,
        last_response: String,
    },
    /// Follow an existing transcript.
    Tail,
    Interactive {
        last_response: String,
    },
    Finished,
}

/// Progress of the transcript follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    Locating,
    Replaying,
    Tailing,
}

/// Result of a future raced against the interrupt.
enum Raced<T> {
    Done(T),
    Interrupted,
}

async fn race<F: Future>(interrupt: &InterruptHandle, future: F) -> Raced<F::Output> {
    tokio::select! {
        output = future => Raced::Done(output),
        _ = interrupt.cancelled() => Raced::Interrupted,
    }
}

async fn pause(interrupt: &InterruptHandle, duration: Duration) -> Raced<()> {
    race(interrupt, tokio::time::sleep(duration)).await
}

pub struct SessionLoop {
    config: Arc<RunConfig>,
    director: Director,
    launcher: Arc<dyn Launcher>,
    locator: TranscriptLocator,
    console: Console,
    conversation: Conversation,
    tail: Option<TranscriptTail>,
    tail_state: TailState,
}

impl SessionLoop {
    pub fn new(
        config: Arc<RunConfig>,
        director: Director,
        launcher: Arc<dyn Launcher>,
        console: Console,
    ) -> Self {
        let locator = TranscriptLocator::new(&config.projects_dir, &config.workdir);
        Self {
            config,
            director,
            launcher,
            locator,
            console,
            conversation: Conversation::new(),
            tail: None,
            tail_state: TailState::Locating,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tail_state(&self) -> TailState {
        self.tail_state
    }

    /// Byte offset of the followed transcript, if one was found.
    pub fn tail_offset(&self) -> Option<u64> {
        self.tail.as_ref().map(TranscriptTail::offset)
    }

    /// Phase the configured mode starts in.
    pub fn initial_phase(&self) -> Phase {
        match (&self.config.mode, &self.config.task) {
            (mode, _) if mode.is_tailing() => Phase::Tail,
            (RunMode::Drive, Some(task)) => Phase::Drive {
                initial: Some(task.clone()),
                last_response: String::new(),
            },
            _ => Phase::Interactive {
                last_response: String::new(),
            },
        }
    }

    /// Runs until the human quits.
    pub async fn run(
        &mut self,
        interrupt: &InterruptHandle,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let mut phase = self.initial_phase();
        self.banner(&phase);

        loop {
            tracing::debug!(?phase, "Entering phase");
            phase = match phase {
                Phase::Drive {
                    initial,
                    last_response,
                } => self.drive(initial, last_response, interrupt).await,
                Phase::Tail => self.tail(interrupt).await,
                Phase::Interactive { last_response } => {
                    self.interactive(last_response, interrupt, prompter).await
                }
                Phase::Finished => break,
            };
        }

        Ok(())
    }

    fn advisor_label(&self) -> String {
        self.director
            .advisor()
            .model()
            .unwrap_or("off")
            .to_string()
    }

    fn banner(&self, phase: &Phase) {
        let config = &self.config;
        match phase {
            Phase::Drive { .. } => self.console.banner(
                "LET THEM COOK - Drive Mode",
                &[
                    format!("Claude: {} | Gemini: {}", config.model, self.advisor_label()),
                    format!(
                        "Max turns: {} | Aggressive: {}",
                        config.max_turns_label(),
                        config.aggressive
                    ),
                ],
                "Press Ctrl+C to take over",
            ),
            Phase::Tail => {
                let mode = match config.mode {
                    RunMode::Passive => "Passive (watch only)".to_string(),
                    RunMode::Steer => format!(
                        "Steer (drives the session, max turns: {})",
                        config.max_turns_label()
                    ),
                    _ => "Active (will chime in)".to_string(),
                };
                self.console.banner(
                    "LET THEM COOK - Watch Mode",
                    &[
                        format!("Mode: {mode}"),
                        format!("Gemini: {}", self.advisor_label()),
                    ],
                    "Press Ctrl+C to take over",
                );
            }
            Phase::Interactive { .. } | Phase::Finished => self.console.banner(
                "LET THEM COOK - Interactive Mode",
                &[format!("Claude: {}", config.model)],
                "/auto - Let cook take over | /quit - Exit",
            ),
        }
    }

    fn take_over(&self, last_response: String) -> Phase {
        self.console
            .warn("\n[interrupted] Switching to interactive mode...");
        Phase::Interactive { last_response }
    }

    // ------------------------------------------------------------------
    // Drive
    // ------------------------------------------------------------------

    async fn drive(
        &mut self,
        initial: Option<String>,
        mut last_response: String,
        interrupt: &InterruptHandle,
    ) -> Phase {
        if let Some(task) = initial {
            self.console.cook(&task);
            match self.relay(&task, false, interrupt).await {
                Raced::Done(response) => last_response = response,
                Raced::Interrupted => return self.take_over(last_response),
            }
        }

        let mut budget = TurnBudget::new(self.config.max_turns);
        loop {
            if budget.is_exhausted() {
                self.console
                    .info(&format!("\n[loop] Finished after {} turns", budget.used()));
                return Phase::Interactive { last_response };
            }

            let task = self.config.task.as_deref();
            let decision = race(
                interrupt,
                self.director
                    .next_instruction(task, &last_response, &self.conversation),
            )
            .await;
            let next = match decision {
                Raced::Done(Some(next)) => next,
                Raced::Done(None) => {
                    self.console.cook_note("Task complete or needs user input.");
                    return Phase::Interactive { last_response };
                }
                Raced::Interrupted => return self.take_over(last_response),
            };

            self.console.cook_auto(&next);
            budget.record();

            if let Raced::Interrupted = pause(interrupt, self.config.timing.throttle).await {
                return self.take_over(last_response);
            }

            match self.relay(&next, true, interrupt).await {
                Raced::Done(response) => last_response = response,
                Raced::Interrupted => return self.take_over(last_response),
            }
        }
    }

    /// Runs one instruction with streaming capture and records the exchange.
    ///
    /// A failed launch becomes an `[ERROR] ...` response.
    async fn relay(
        &mut self,
        instruction: &str,
        continue_prior: bool,
        interrupt: &InterruptHandle,
    ) -> Raced<String> {
        let launcher = Arc::clone(&self.launcher);
        let outcome = race(interrupt, launcher.run(instruction, continue_prior)).await;

        let response = match outcome {
            Raced::Done(Ok(response)) => response,
            Raced::Done(Err(e)) => {
                tracing::error!(error = %e, "Execution agent run failed");
                let response = format!("[ERROR] {e}");
                self.console.error(&response);
                response
            }
            Raced::Interrupted => return Raced::Interrupted,
        };

        self.conversation.push(Message::user(instruction));
        self.conversation.push(Message::assistant(response.clone()));
        Raced::Done(response)
    }

    // ------------------------------------------------------------------
    // Tail
    // ------------------------------------------------------------------

    fn last_seen_response(&self) -> String {
        self.conversation
            .last_assistant_text()
            .unwrap_or_default()
            .to_string()
    }

    async fn tail(&mut self, interrupt: &InterruptHandle) -> Phase {
        let mut tail = match self.tail.take() {
            Some(tail) => tail,
            None => match self.locate(interrupt).await {
                Raced::Done(tail) => tail,
                Raced::Interrupted => return self.take_over(self.last_seen_response()),
            },
        };

        if self.tail_state == TailState::Replaying {
            match tail.replay().await {
                Ok(history) => {
                    tracing::info!(messages = history.len(), "Replayed transcript history");
                    self.conversation.extend(history);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to replay transcript history");
                }
            }
            self.tail_state = TailState::Tailing;
        }

        let mut budget = TurnBudget::new(self.config.max_turns);
        let phase = self.follow(&mut tail, &mut budget, interrupt).await;
        self.tail = Some(tail);
        phase
    }

    async fn locate(&mut self, interrupt: &InterruptHandle) -> Raced<TranscriptTail> {
        self.tail_state = TailState::Locating;
        self.console.info("[watcher] Looking for session file...");

        loop {
            if let Some(path) = self.locator.latest_non_empty() {
                let tail = TranscriptTail::new(path);
                self.console
                    .success(&format!("[watcher] Found: {}", tail.name()));
                self.console.dim("[watcher] Tailing session...\n");
                self.tail_state = TailState::Replaying;
                return Raced::Done(tail);
            }
            if let Raced::Interrupted = pause(interrupt, self.config.timing.locate_interval).await
            {
                return Raced::Interrupted;
            }
        }
    }

    async fn follow(
        &mut self,
        tail: &mut TranscriptTail,
        budget: &mut TurnBudget,
        interrupt: &InterruptHandle,
    ) -> Phase {
        loop {
            match tail.poll().await {
                Ok(messages) => {
                    let mut pending = messages.into_iter();
                    while let Some(message) = pending.next() {
                        self.console.message(&message);
                        self.conversation.push(message.clone());

                        if !message.is_assistant() {
                            continue;
                        }
                        if let Some(phase) = self.react(&message, budget, interrupt).await {
                            for rest in pending {
                                self.console.message(&rest);
                                self.conversation.push(rest);
                            }
                            return phase;
                        }
                    }
                }
                Err(e) => {
                    self.console.error(&format!("[watcher:error] {e}"));
                    tracing::warn!(error = %e, path = %tail.path().display(), "Transcript poll failed");
                    if let Raced::Interrupted =
                        pause(interrupt, self.config.timing.error_backoff).await
                    {
                        return self.take_over(self.last_seen_response());
                    }
                    continue;
                }
            }

            if let Raced::Interrupted = pause(interrupt, self.config.timing.poll_interval).await {
                return self.take_over(self.last_seen_response());
            }
        }
    }

    /// Decides whether a freshly tailed assistant message gets a reply.
    ///
    /// Returns the phase to switch to when tailing should stop.
    async fn react(
        &mut self,
        message: &Message,
        budget: &mut TurnBudget,
        interrupt: &InterruptHandle,
    ) -> Option<Phase> {
        let task = self.config.task.as_deref();
        let decision = match self.config.mode {
            RunMode::Passive => return None,
            RunMode::Steer => {
                if budget.is_exhausted() {
                    self.console
                        .info(&format!("\n[loop] Finished after {} turns", budget.used()));
                    return Some(Phase::Interactive {
                        last_response: message.text.clone(),
                    });
                }
                race(
                    interrupt,
                    self.director
                        .next_instruction(task, &message.text, &self.conversation),
                )
                .await
            }
            _ => {
                race(
                    interrupt,
                    self.director.chime_in(task, message, &self.conversation),
                )
                .await
            }
        };

        let instruction = match decision {
            Raced::Done(Some(instruction)) => instruction,
            Raced::Done(None) => return None,
            Raced::Interrupted => return Some(self.take_over(message.text.clone())),
        };

        self.console.cook(&instruction);
        budget.record();

        if let Raced::Interrupted = pause(interrupt, self.config.timing.throttle).await {
            return Some(self.take_over(message.text.clone()));
        }

        match self.launcher.spawn_detached(&instruction) {
            Ok(()) => self
                .console
                .dim("[sent - Claude will respond in session]\n"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to relay instruction");
                self.console.error(&format!("[ERROR] {e}"));
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Interactive
    // ------------------------------------------------------------------

    async fn interactive(
        &mut self,
        mut last_response: String,
        interrupt: &InterruptHandle,
        prompter: &mut dyn Prompter,
    ) -> Phase {
        interrupt.clear();
        self.console.interactive_banner();

        loop {
            let line = match prompter.read_line(PROMPT).await {
                PromptInput::Line(line) => line,
                PromptInput::Interrupted => {
                    self.console.dim("\n[exiting]");
                    return Phase::Finished;
                }
                PromptInput::Eof => return Phase::Finished,
            };

            match InteractiveCommand::parse(&line) {
                InteractiveCommand::Empty => continue,
                InteractiveCommand::Quit => {
                    self.console.dim("[goodbye]");
                    return Phase::Finished;
                }
                InteractiveCommand::Auto => {
                    self.console.cook_note("[resuming autonomous mode...]");
                    return Phase::Drive {
                        initial: None,
                        last_response,
                    };
                }
                InteractiveCommand::Say(text) => {
                    match self.relay(&text, true, interrupt).await {
                        Raced::Done(response) => last_response = response,
                        Raced::Interrupted => {
                            self.console.warn("\n[interrupted]");
                            interrupt.clear();
                        }
                    }
                }
            }
        }
    }
}
