//! Replay errors and outcomes.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::log::LogParseError;

/// Errors that can end or prevent a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The log could not be opened.
    #[error("Failed to open log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the log failed mid-stream.
    #[error("Failed to read log: {0}")]
    Read(#[source] io::Error),

    /// A line could not be parsed.
    #[error("Malformed line {line}: {source}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        #[source]
        source: LogParseError,
    },

    /// The replay thread could not be started.
    #[error("Failed to spawn replay thread: {0}")]
    Spawn(#[source] io::Error),
}

/// How a replay run ended.
///
/// Every ending stops the stream the same way; the outcome only tells
/// observers why.
#[derive(Debug, Clone)]
pub enum ReplayOutcome {
    /// End of input, or a blank line, was reached.
    Completed,
    /// `stop()` was called before the end of input.
    Stopped,
    /// The input was unreadable or malformed.
    Failed(Arc<ReplayError>),
}

impl ReplayOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ReplayOutcome::Completed)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ReplayOutcome::Stopped)
    }

    /// The error that ended the run, if any.
    pub fn error(&self) -> Option<&ReplayError> {
        match self {
            ReplayOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ReplayError> for ReplayOutcome {
    fn from(error: ReplayError) -> Self {
        ReplayOutcome::Failed(Arc::new(error))
    }
}

impl std::fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayOutcome::Completed => write!(f, "completed"),
            ReplayOutcome::Stopped => write!(f, "stopped"),
            ReplayOutcome::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}
