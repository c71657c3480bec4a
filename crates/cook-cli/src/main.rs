use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use cook_core::config::AdvisorSettings;
use cook_core::{Console, RunConfig, RunMode, Settings, Timing};
use cook_execution::{InterruptHandle, SessionLoop, init_tracing};
use cook_infrastructure::{CookPaths, SecretStorage, SettingsStorage, resolve_agent_binary};
use cook_interaction::{Advisor, ClaudeCodeLauncher, DisabledAdvisor, Director, GeminiApiAgent, Launcher};

mod readline;

use readline::ReadlinePrompter;

#[derive(Parser, Debug)]
#[command(name = "cook")]
#[command(about = "Let Them Cook - a Gemini director steering Claude Code", long_about = None)]
struct Cli {
    /// Task to drive Claude through
    task: Option<String>,

    /// Watch mode - tail the latest session and chime in
    #[arg(short, long)]
    watch: bool,

    /// Passive mode - watch only, don't intervene
    #[arg(short, long)]
    passive: bool,

    /// Steer mode - tail the latest session and keep driving it
    #[arg(long)]
    steer: bool,

    /// Less aggressive - only act when necessary
    #[arg(long)]
    no_aggressive: bool,

    /// Claude model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Max director turns, 0 = unlimited
    #[arg(long, default_value_t = 0)]
    max_turns: u32,

    /// Gemini model for the director
    #[arg(long)]
    advisor_model: Option<String>,

    /// Settings file (default: ~/.config/cook/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> RunMode {
        if self.passive {
            RunMode::Passive
        } else if self.steer {
            RunMode::Steer
        } else if self.watch {
            RunMode::Watch
        } else if self.task.is_some() {
            RunMode::Drive
        } else {
            RunMode::Interactive
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Settings {
    let storage = match path {
        Some(path) => SettingsStorage::with_path(path.clone()),
        None => match SettingsStorage::new() {
            Ok(storage) => storage,
            Err(e) => {
                tracing::warn!(error = %e, "No settings location; using defaults");
                return Settings::default();
            }
        },
    };
    storage.load_or_default()
}

/// Gemini director if a credential is available, otherwise a stand-in that
/// always declines.
fn build_advisor(
    settings: &AdvisorSettings,
    model_override: Option<&str>,
    console: &Console,
) -> Arc<dyn Advisor> {
    let secrets = SecretStorage::new().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Secret file location unavailable");
        SecretStorage::with_path(PathBuf::new())
    });

    match GeminiApiAgent::try_from_env(&secrets, &settings.model) {
        Ok(agent) => {
            let agent = match model_override {
                Some(model) => agent.with_model(model),
                None => agent,
            };
            tracing::info!(model = agent.model_name(), "Gemini director enabled");
            Arc::new(agent.with_timeout(Duration::from_secs(settings.timeout_secs)))
        }
        Err(e) => {
            tracing::info!(error = %e, "Gemini director disabled");
            console.warn("[!] No Gemini API key found - the director is off");
            Arc::new(DisabledAdvisor)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_dir = CookPaths::logs_dir().ok();
    let _log_guard = init_tracing(cli.verbose, log_dir.as_deref());

    let console = Console::default();
    let settings = load_settings(cli.config.as_ref());

    let Some(agent_binary) = resolve_agent_binary(&settings.agent.binary) else {
        console.error("[!] Claude Code not found");
        console.dim(&format!(
            "Looked for '{}' on PATH and in ~/.local/bin",
            settings.agent.binary
        ));
        std::process::exit(1);
    };
    tracing::debug!(binary = %agent_binary.display(), "Resolved execution agent");

    let workdir = std::env::current_dir().context("Cannot read the current directory")?;
    let projects_dir = CookPaths::claude_projects_dir()?;

    let mut config = RunConfig::new(cli.mode(), agent_binary, workdir, projects_dir)
        .with_model(cli.model.clone().unwrap_or_else(|| settings.agent.model.clone()))
        .with_aggressive(!cli.no_aggressive)
        .with_max_turns(cli.max_turns)
        .with_advisor(settings.advisor.clone())
        .with_timing(Timing::from(&settings.timing));
    if let Some(task) = &cli.task {
        config = config.with_task(task.clone());
    }
    let config = Arc::new(config);

    let advisor = build_advisor(&settings.advisor, cli.advisor_model.as_deref(), &console);
    let director = Director::new(advisor, &config);
    let launcher: Arc<dyn Launcher> = Arc::new(ClaudeCodeLauncher::new(&config, console.clone()));

    let interrupt = InterruptHandle::new();
    let ctrl_c = interrupt.listen_for_ctrl_c();
    let mut prompter = ReadlinePrompter::spawn()?;

    let mut session = SessionLoop::new(config, director, launcher, console);
    let outcome = session.run(&interrupt, &mut prompter).await;
    ctrl_c.abort();

    outcome?;
    Ok(())
}
