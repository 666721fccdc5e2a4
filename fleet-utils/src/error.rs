//! Error types for the fleet console
//!
//! Provides a unified error type used across all fleet crates.

use std::path::PathBuf;

/// Main error type for fleet console operations
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Transport Errors ===

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Reconnect gave up after {attempts} attempts; restart the console to reconnect")]
    ReconnectExhausted { attempts: u32 },

    #[error("Not connected to the server")]
    NotConnected,

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    // === Fetch Errors ===

    #[error("Failed to fetch {operation}: {message}")]
    Fetch { operation: String, message: String },

    #[error("Malformed response from {operation}: {message}")]
    Parse { operation: String, message: String },

    // === User Input Errors ===

    #[error("Invalid input: {0}")]
    Validation(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a fetch error for a named operation
    pub fn fetch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a parse error for a named operation
    pub fn parse(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is retryable
    ///
    /// Fetch and parse failures are retried by re-issuing the same request;
    /// transport errors are retried by the reconnect schedule.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionClosed
                | Self::Fetch { .. }
                | Self::Parse { .. }
        )
    }

    /// Check if this error ends the session (manual restart required)
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReconnectExhausted { .. })
    }
}

/// Result type alias using ConsoleError
pub type Result<T> = std::result::Result<T, ConsoleError>;
