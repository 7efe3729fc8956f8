//! Crate-wide error type.
//!
//! Every failure a run or a listing can end with, and the process exit code
//! each one maps to.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::dag::DagError;
use crate::execution::CommandError;

/// Exit code used for every failure that carries no code of its own.
pub const EXIT_FAILURE: i32 = 1;

/// Errors returned by [`Runner`](crate::Runner) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The task set could not be obtained.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unknown task or task cycle found before anything ran.
    #[error(transparent)]
    Plan(#[from] DagError),

    /// An ephemeral file could not be created, written or removed.
    #[error("error with task file: {message}: {source}")]
    TaskFile {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The run deadline expired.
    #[error("task timed out after {after:?}{}", display_cause(.source))]
    Timeout {
        after: Duration,
        #[source]
        source: Option<Box<Error>>,
    },

    /// A command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Unsupported listing format.
    #[error("list tasks: unknown option: `{0}`")]
    UnknownFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("error marshaling as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_cause(source: &Option<Box<Error>>) -> String {
    match source {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn task_file(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::TaskFile {
            message: message.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// A failed command keeps its own code, including through a timeout.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command(err) => err.exit_code,
            Self::Timeout {
                source: Some(inner),
                ..
            } => match inner.as_ref() {
                Self::Command(err) => err.exit_code,
                _ => EXIT_FAILURE,
            },
            _ => EXIT_FAILURE,
        }
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
