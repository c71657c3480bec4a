//! Runs the launcher against a stand-in `claude` script.
#![cfg(unix)]

use cook_core::{Console, RunConfig, RunMode};
use cook_infrastructure::transcript_locator::project_dir_name;
use cook_interaction::{ClaudeCodeLauncher, Launcher};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    workdir: PathBuf,
    projects: PathBuf,
    bin_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let workdir = root.path().join("work");
        let projects = root.path().join("projects");
        let bin_dir = root.path().join("bin");
        for dir in [&workdir, &projects, &bin_dir] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            _root: root,
            workdir,
            projects,
            bin_dir,
        }
    }

    /// Writes an executable script named `claude` and returns its path.
    fn script(&self, body: &str) -> PathBuf {
        let path = self.bin_dir.join("claude");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn launcher(&self, binary: &Path) -> ClaudeCodeLauncher {
        let config = RunConfig::new(
            RunMode::Drive,
            binary.to_path_buf(),
            self.workdir.clone(),
            self.projects.clone(),
        );
        ClaudeCodeLauncher::new(&config, Console::default())
    }

    fn session_dir(&self) -> PathBuf {
        let dir = self.projects.join(project_dir_name(&self.workdir));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

const STREAM: &str = r#"cat <<'EOF'
{"type":"system","subtype":"init","model":"claude-test"}
{"type":"assistant","message":{"content":[{"type":"text","text":"Working on it"}]}}
this line is not json
{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"ls"}},{"type":"text","text":"Finished"}]}}
{"type":"result","subtype":"success","total_cost_usd":0.01,"duration_ms":20,"result":"Finished"}
EOF"#;

#[tokio::test]
async fn test_run_collects_streamed_text() {
    let fixture = Fixture::new();
    let binary = fixture.script(STREAM);

    let response = fixture.launcher(&binary).run("build X", false).await.unwrap();
    assert_eq!(response, "Working on it\nFinished");
}

#[tokio::test]
async fn test_run_prefers_longer_transcript_reply() {
    let fixture = Fixture::new();
    let binary = fixture.script(STREAM);
    fs::write(
        fixture.session_dir().join("session.jsonl"),
        concat!(
            r#"{"type":"user","message":{"content":"build X"}}"#,
            "\n",
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Working on it, and here is the complete final summary"}]}}"#,
            "\n"
        ),
    )
    .unwrap();

    let response = fixture.launcher(&binary).run("build X", true).await.unwrap();
    assert_eq!(
        response,
        "Working on it, and here is the complete final summary"
    );
}

#[tokio::test]
async fn test_run_without_text_reports_placeholder() {
    let fixture = Fixture::new();
    let binary = fixture.script(r#"echo '{"type":"result","subtype":"error_max_turns"}'; exit 3"#);

    let response = fixture.launcher(&binary).run("hi", false).await.unwrap();
    assert_eq!(response, "[no text response]");
}

#[tokio::test]
async fn test_run_passes_arguments_in_workdir() {
    let fixture = Fixture::new();
    let binary = fixture.script(
        r#"printf '{"type":"assistant","message":{"content":[{"type":"text","text":"%s | %s"}]}}\n' "$(pwd)" "$*""#,
    );

    let response = fixture.launcher(&binary).run("go", true).await.unwrap();
    let workdir = fs::canonicalize(&fixture.workdir).unwrap();
    assert_eq!(
        response,
        format!(
            "{} | -p --model sonnet --dangerously-skip-permissions --output-format stream-json --verbose --continue go",
            workdir.display()
        )
    );
}

#[tokio::test]
async fn test_spawn_detached_returns_immediately() {
    let fixture = Fixture::new();
    let marker = fixture.workdir.join("args.txt");
    let binary = fixture.script(&format!("sleep 1\necho \"$*\" > '{}'", marker.display()));

    let launcher = fixture.launcher(&binary);
    launcher.spawn_detached("fix it").unwrap();
    assert!(!marker.exists());

    let mut written = String::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(content) = fs::read_to_string(&marker) {
            if !content.is_empty() {
                written = content;
                break;
            }
        }
    }
    assert_eq!(
        written.trim(),
        "-p --model sonnet --dangerously-skip-permissions --continue fix it"
    );
}
