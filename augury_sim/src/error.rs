//! Error types for the augury harness and CLI.

use std::io;
use std::path::PathBuf;

use augury_core::{AggregateError, RunError};
use augury_env::EnvError;
use thiserror::Error;

use crate::report::ReportError;

/// Anything that can end a session, batch or CLI invocation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Filesystem or console failure, with what was being attempted.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// An edited actor file no longer parses.
    #[error("failed to unmarshal actor {}: {source}", path.display())]
    ActorFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Report(#[from] ReportError),

    /// Generator construction (missing key, bad client config).
    #[error(transparent)]
    Generator(#[from] EnvError),

    /// Invalid combination of command-line options.
    #[error("{0}")]
    Usage(String),
}

impl SimError {
    /// Adapter for `map_err` on io results.
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_context() {
        let err = SimError::io("failed to create session directory")(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.to_string(), "failed to create session directory: denied");
    }
}
