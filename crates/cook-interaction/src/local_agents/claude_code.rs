//! ClaudeCodeLauncher - drives the `claude` CLI in print mode.
//!
//! Streaming runs use `--output-format stream-json` so every event can be
//! rendered as it arrives; detached runs use plain print mode and discard
//! their output.

use async_trait::async_trait;
use cook_core::stream::{StreamCollector, decode_stream_event, reconcile};
use cook_core::{Console, CookError, RunConfig};
use cook_infrastructure::{TranscriptLocator, read_last_message};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::launcher::Launcher;

/// Output mode requested from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Newline-delimited JSON events (`--output-format stream-json --verbose`).
    StreamJson,
    /// The CLI's default text output.
    Text,
}

/// Launcher backed by the `claude` executable.
#[derive(Debug, Clone)]
pub struct ClaudeCodeLauncher {
    binary: PathBuf,
    model: String,
    workdir: PathBuf,
    locator: TranscriptLocator,
    console: Console,
}

impl ClaudeCodeLauncher {
    pub fn new(config: &RunConfig, console: Console) -> Self {
        Self {
            binary: config.agent_binary.clone(),
            model: config.model.clone(),
            workdir: config.workdir.clone(),
            locator: TranscriptLocator::new(&config.projects_dir, &config.workdir),
            console,
        }
    }

    /// Command-line arguments for one run.
    ///
    /// Text output always continues the latest session.
    pub fn build_args(
        &self,
        instruction: &str,
        continue_prior: bool,
        format: OutputFormat,
    ) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--dangerously-skip-permissions".to_string(),
        ];

        match format {
            OutputFormat::StreamJson => {
                args.extend([
                    "--output-format".to_string(),
                    "stream-json".to_string(),
                    "--verbose".to_string(),
                ]);
                if continue_prior {
                    args.push("--continue".to_string());
                }
            }
            OutputFormat::Text => args.push("--continue".to_string()),
        }

        args.push(instruction.to_string());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            // The CLI refuses to start when it believes it is nested in another session.
            .env_remove("CLAUDECODE");
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> CookError {
        log::error!("Failed to spawn {}: {}", self.binary.display(), e);
        CookError::launch(format!(
            "Failed to start Claude ({}): {}",
            self.binary.display(),
            e
        ))
    }

    /// Last record of the newest transcript, if one can be read.
    async fn transcript_last(&self) -> Option<cook_core::Message> {
        let path = self.locator.latest()?;
        match read_last_message(&path).await {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Could not read {}: {}", path.display(), e);
                None
            }
        }
    }
}

async fn drain_stderr(stderr: impl AsyncRead + Unpin) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.trim().is_empty() {
            log::debug!("[claude:stderr] {}", line);
        }
    }
}

#[async_trait]
impl Launcher for ClaudeCodeLauncher {
    async fn run(&self, instruction: &str, continue_prior: bool) -> Result<String, CookError> {
        let args = self.build_args(instruction, continue_prior, OutputFormat::StreamJson);

        log::info!("ClaudeCodeLauncher executing (continue={})", continue_prior);
        log::debug!("Instruction length: {} chars", instruction.len());

        self.console.rule();

        let mut child = self
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CookError::internal("child stdout not captured"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }

        let mut reader = BufReader::new(stdout);
        let mut collector = StreamCollector::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match decode_stream_event(line) {
                Some(event) => {
                    self.console.stream_event(&event);
                    collector.observe(&event);
                }
                None => self.console.raw(line),
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            log::warn!("Claude exited with {}", status);
        }

        self.console.rule();

        let captured = collector.finish();
        let last = self.transcript_last().await;
        let response = reconcile(captured, last.as_ref());

        log::info!("ClaudeCodeLauncher completed");
        log::debug!("Response length: {} chars", response.len());

        Ok(response)
    }

    fn spawn_detached(&self, instruction: &str) -> Result<(), CookError> {
        let args = self.build_args(instruction, true, OutputFormat::Text);

        let mut child = self
            .command(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        log::debug!("Detached claude run started (pid {:?})", child.id());

        // Nothing waits on this task; the reply arrives through the transcript.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => log::debug!("Detached claude run finished"),
                Ok(status) => log::warn!("Detached claude run exited with {}", status),
                Err(e) => log::warn!("Detached claude run could not be reaped: {}", e),
            }
        });

        Ok(())
    }
}
