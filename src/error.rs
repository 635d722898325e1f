//! Error types for termfolio.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a terminal or loading its configuration.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// A collaborator is missing or a session parameter is out of range.
    #[error("invalid argument configuration: {message}")]
    InvalidArgumentConfiguration { message: String },

    /// The configuration file could not be parsed.
    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TerminalError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgumentConfiguration {
            message: message.into(),
        }
    }
}

/// Why a submitted command line produced no regular output.
///
/// Both variants end up as the same "command not found" line for the user;
/// they stay separate so the failure path can be inspected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{token}: command not found")]
    CommandNotFound { token: String },

    #[error("{command} failed: {reason}")]
    HandlerFailure { command: String, reason: String },
}
