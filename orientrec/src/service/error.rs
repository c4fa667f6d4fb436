//! Service errors.

use thiserror::Error;

use crate::replay::ReplayError;

/// Errors returned by [`RecorderService`](super::RecorderService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested log could not be replayed.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// A replay identifier must be a bare file name inside the log directory.
    #[error("Invalid log name '{0}': expected a file name without path components")]
    InvalidLogName(String),
}
