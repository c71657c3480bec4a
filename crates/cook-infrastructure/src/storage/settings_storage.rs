//! Settings file storage (`config.toml`).

use crate::paths::CookPaths;
use cook_core::{CookError, Result, Settings};
use std::fs;
use std::path::PathBuf;

/// Read-only storage for `config.toml`.
pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    /// Creates a SettingsStorage with the default path (~/.config/cook/config.toml).
    pub fn new() -> Result<Self> {
        let path = CookPaths::config_file().map_err(|e| CookError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a SettingsStorage with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads settings.
    ///
    /// A missing or empty file yields the defaults; a file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Loads settings, falling back to defaults when the file is unusable.
    pub fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Ignoring unreadable settings file, using defaults"
            );
            Settings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SettingsStorage::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(storage.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_load_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[agent]
binary = "/opt/claude/bin/claude"

[advisor]
model = "gemini-2.5-flash"
chime_in_max_tokens = 256
"#,
        )
        .unwrap();

        let settings = SettingsStorage::with_path(path).load().unwrap();
        assert_eq!(settings.agent.binary, "/opt/claude/bin/claude");
        assert_eq!(settings.agent.model, "sonnet");
        assert_eq!(settings.advisor.model, "gemini-2.5-flash");
        assert_eq!(settings.advisor.chime_in_max_tokens, 256);
        assert_eq!(settings.advisor.continuation_max_tokens, 500);
    }

    #[test]
    fn test_invalid_toml_is_error_but_load_or_default_recovers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[agent\nbinary = ").unwrap();

        let storage = SettingsStorage::with_path(path);
        assert!(matches!(
            storage.load(),
            Err(CookError::Serialization { .. })
        ));
        assert_eq!(storage.load_or_default(), Settings::default());
    }
}
