//! Error types for the augury environment abstraction.

use thiserror::Error;

/// Errors that can occur while talking to the outside world.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Transport failure (connection refused, TLS, body read, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The backend answered but the payload had no usable content
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Missing credential or endpoint configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scripted failure injected by a test harness
    #[error("Injected failure: {0}")]
    Injected(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an injected error.
    pub fn injected(msg: impl Into<String>) -> Self {
        Self::Injected(msg.into())
    }
}
