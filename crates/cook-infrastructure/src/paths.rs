//! Unified path management for cook configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/cook/              # Config directory
//! ├── config.toml              # Settings (agent, advisor, timing)
//! ├── secret.json              # API keys
//! └── logs/                    # Application logs
//!     └── cook.log.YYYY-MM-DD
//!
//! ~/.claude/projects/          # Execution-agent transcripts (read-only)
//! └── -home-me-project/
//!     └── <session-id>.jsonl
//! ```

use std::env;
use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for cook.
pub struct CookPaths;

impl CookPaths {
    fn home_dir() -> Result<PathBuf, PathError> {
        dirs::home_dir().ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the cook configuration directory (`~/.config/cook/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Ok(Self::home_dir()?.join(".config").join("cook"))
    }

    /// Returns the path to the settings file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }

    /// Returns the execution agent's per-project transcript root (`~/.claude/projects/`).
    pub fn claude_projects_dir() -> Result<PathBuf, PathError> {
        Ok(Self::home_dir()?.join(".claude").join("projects"))
    }

    /// Fallback install location of the execution agent (`~/.local/bin/<name>`).
    pub fn local_bin(name: &str) -> Result<PathBuf, PathError> {
        Ok(Self::home_dir()?.join(".local").join("bin").join(name))
    }
}

/// Resolves the execution-agent executable.
///
/// A value containing a path separator is used as-is when it exists. A bare
/// name is searched on `PATH`, then in `~/.local/bin`.
pub fn resolve_agent_binary(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    if let Some(path_var) = env::var_os("PATH") {
        if let Some(found) = search_path(binary, env::split_paths(&path_var)) {
            return Some(found);
        }
    }

    CookPaths::local_bin(binary).ok().filter(|p| p.is_file())
}

/// Finds `name` in the given directories.
pub fn search_path(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
