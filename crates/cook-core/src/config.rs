//! Configuration types.
//!
//! [`Settings`] mirrors the optional `config.toml` file; [`RunConfig`] is the
//! immutable configuration of one invocation, built once at startup from the
//! settings and the command line.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AGENT_BINARY: &str = "claude";
pub const DEFAULT_AGENT_MODEL: &str = "sonnet";
pub const DEFAULT_ADVISOR_MODEL: &str = "gemini-2.0-flash";

/// How the session loop behaves for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Drive the agent through a task, deciding every next instruction.
    Drive,
    /// Tail an existing session and chime in when useful.
    Watch,
    /// Tail an existing session and drive it with continuation prompts.
    Steer,
    /// Tail an existing session without ever intervening.
    Passive,
    /// Line-by-line human input.
    Interactive,
}

impl RunMode {
    /// Whether this mode starts by tailing a transcript.
    pub fn is_tailing(&self) -> bool {
        matches!(self, RunMode::Watch | RunMode::Steer | RunMode::Passive)
    }
}

/// `[agent]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Executable name or path of the execution agent.
    pub binary: String,
    /// Model selector passed through `--model`.
    pub model: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            binary: DEFAULT_AGENT_BINARY.to_string(),
            model: DEFAULT_AGENT_MODEL.to_string(),
        }
    }
}

/// `[advisor]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorSettings {
    pub model: String,
    pub continuation_max_tokens: u32,
    pub chime_in_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_ADVISOR_MODEL.to_string(),
            continuation_max_tokens: 500,
            chime_in_max_tokens: 400,
            timeout_secs: 60,
        }
    }
}

/// `[timing]` table, all values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub locate_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub throttle_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            locate_interval_ms: 1000,
            poll_interval_ms: 500,
            throttle_ms: 2000,
            error_backoff_ms: 1000,
        }
    }
}

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub agent: AgentSettings,
    pub advisor: AdvisorSettings,
    pub timing: TimingSettings,
}

/// Contents of `secret.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiSecret>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Resolved waits used by the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait between checks while no transcript exists yet.
    pub locate_interval: Duration,
    /// Wait between tailing cycles.
    pub poll_interval: Duration,
    /// Wait before relaying an instruction.
    pub throttle: Duration,
    /// Wait after a transcript I/O fault.
    pub error_backoff: Duration,
}

impl From<&TimingSettings> for Timing {
    fn from(settings: &TimingSettings) -> Self {
        Self {
            locate_interval: Duration::from_millis(settings.locate_interval_ms),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            throttle: Duration::from_millis(settings.throttle_ms),
            error_backoff: Duration::from_millis(settings.error_backoff_ms),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from(&TimingSettings::default())
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Original task, if one was given.
    pub task: Option<String>,
    pub mode: RunMode,
    /// Execution-agent model selector.
    pub model: String,
    /// Push for continuous iteration instead of stopping early.
    pub aggressive: bool,
    /// Maximum director instructions before handing over to the human; 0 is unbounded.
    pub max_turns: u32,
    /// Resolved execution-agent executable.
    pub agent_binary: PathBuf,
    /// Directory the agent runs in; also selects the transcript directory.
    pub workdir: PathBuf,
    /// Root of the agent's per-project transcript directories.
    pub projects_dir: PathBuf,
    pub advisor: AdvisorSettings,
    pub timing: Timing,
}

impl RunConfig {
    /// Creates a configuration with default settings for the given mode.
    pub fn new(mode: RunMode, agent_binary: PathBuf, workdir: PathBuf, projects_dir: PathBuf) -> Self {
        Self {
            task: None,
            mode,
            model: DEFAULT_AGENT_MODEL.to_string(),
            aggressive: true,
            max_turns: 0,
            agent_binary,
            workdir,
            projects_dir,
            advisor: AdvisorSettings::default(),
            timing: Timing::default(),
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_aggressive(mut self, aggressive: bool) -> Self {
        self.aggressive = aggressive;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_advisor(mut self, advisor: AdvisorSettings) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn is_passive(&self) -> bool {
        self.mode == RunMode::Passive
    }

    /// Human-readable turn limit.
    pub fn max_turns_label(&self) -> String {
        if self.max_turns == 0 {
            "unlimited".to_string()
        } else {
            self.max_turns.to_string()
        }
    }
}
