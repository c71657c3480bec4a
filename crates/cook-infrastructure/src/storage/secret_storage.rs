//! Credential file storage (`secret.json`).

use crate::paths::CookPaths;
use cook_core::config::SecretConfig;
use cook_core::{CookError, Result};
use std::fs;
use std::path::PathBuf;

/// Read-only storage for `secret.json`. Keys are never logged.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Storage at ~/.config/cook/secret.json.
    pub fn new() -> Result<Self> {
        let path = CookPaths::secret_file().map_err(|e| CookError::config(e.to_string()))?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// `None` when there is no secret file. A file that cannot be read or
    /// parsed is an error.
    pub fn load(&self) -> Result<Option<SecretConfig>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_gemini_section_is_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(
            &path,
            r#"{ "gemini": { "api_key": "AIza-local", "model_name": "gemini-2.5-pro" } }"#,
        )
        .unwrap();

        let config = SecretStorage::with_path(path).load().unwrap().unwrap();
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, "AIza-local");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_file_without_gemini_section() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, "{}").unwrap();

        let config = SecretStorage::with_path(path).load().unwrap().unwrap();
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, "{ \"gemini\": ").unwrap();

        let result = SecretStorage::with_path(path).load();
        assert!(matches!(result, Err(CookError::Serialization { .. })));
    }
}
