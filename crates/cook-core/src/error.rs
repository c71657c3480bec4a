//! Error types for the Cook application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Cook application.
///
/// Only a missing execution-agent binary is fatal; every other variant is
/// reported and the session loop keeps going.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CookError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The execution agent could not be started
    #[error("Launch error: {0}")]
    Launch(String),

    /// Transcript could not be located or read
    #[error("Transcript error: {0}")]
    Transcript(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CookError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Launch error
    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch(message.into())
    }

    /// Creates a Transcript error
    pub fn transcript(message: impl Into<String>) -> Self {
        Self::Transcript(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this is a launch error
    pub fn is_launch(&self) -> bool {
        matches!(self, Self::Launch(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CookError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CookError>`.
pub type Result<T> = std::result::Result<T, CookError>;
