//! Finds the execution agent's transcript for a working directory.
//!
//! The agent keeps one directory per project under its projects root, named
//! after the project's absolute path with separators replaced by `-`, and
//! appends one `*.jsonl` file per session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directory name the agent uses for `workdir`: every `/` becomes `-`.
pub fn project_dir_name(workdir: &Path) -> String {
    workdir.to_string_lossy().replace('/', "-")
}

/// Looser variant in which every non-alphanumeric character becomes `-`.
pub fn sanitized_project_dir_name(workdir: &Path) -> String {
    workdir
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Locates session transcripts for one working directory.
#[derive(Debug, Clone)]
pub struct TranscriptLocator {
    projects_dir: PathBuf,
    workdir: PathBuf,
}

impl TranscriptLocator {
    pub fn new(projects_dir: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Candidate session directories, most specific first.
    pub fn session_dirs(&self) -> Vec<PathBuf> {
        let exact = self.projects_dir.join(project_dir_name(&self.workdir));
        let sanitized = self.projects_dir.join(sanitized_project_dir_name(&self.workdir));
        if exact == sanitized {
            vec![exact]
        } else {
            vec![exact, sanitized]
        }
    }

    /// The first candidate directory that exists.
    pub fn session_dir(&self) -> Option<PathBuf> {
        self.session_dirs().into_iter().find(|dir| dir.is_dir())
    }

    /// Newest `*.jsonl` transcript by modification time, if any.
    pub fn latest(&self) -> Option<PathBuf> {
        let dir = self.session_dir()?;
        match newest_jsonl(&dir) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Failed to scan session directory");
                None
            }
        }
    }

    /// Newest transcript that already has content.
    pub fn latest_non_empty(&self) -> Option<PathBuf> {
        self.latest()
            .filter(|path| fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false))
    }
}

fn newest_jsonl(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}
