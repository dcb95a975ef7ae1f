//! Error types shared by the store, registry and launcher.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the core of cm.
///
/// The front-end decides how each variant is presented and which exit code
/// it maps to; nothing in the core terminates the process.
#[derive(Debug, Error)]
pub enum CmError {
    /// A required field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// A model with this name already exists.
    #[error("Model \"{name}\" already exists")]
    Conflict { name: String },

    /// The operation targets a model that does not exist.
    #[error("Model \"{name}\" not found")]
    NotFound { name: String },

    /// Reading or writing a file under the config directory failed.
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persisted document could not be parsed or serialized.
    #[error("Failed to {action} {}: {source}", path.display())]
    Json {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The external assistant binary could not be located.
    #[error("\"{program}\" command not found")]
    LaunchNotFound { program: String },

    /// Any other failure while spawning or waiting for the assistant.
    #[error("Error launching {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl CmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn json(action: &'static str, path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            action,
            path: path.into(),
            source,
        }
    }

    /// True for failures of the underlying files rather than of the request.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Json { .. })
    }
}

pub type Result<T, E = CmError> = std::result::Result<T, E>;
