//! Error types for session recovery

use std::time::Duration;

use transport::{AlreadyRetried, TransportError};

/// Why a refresh cycle failed. Cloned to every caller queued on the cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh endpoint returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh request failed: {0}")]
    Transport(TransportError),

    #[error("refresh timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("refresh abandoned before completing")]
    Abandoned,
}

impl From<TransportError> for RefreshError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status {
                status, message, ..
            } => RefreshError::Rejected { status, message },
            other => RefreshError::Transport(other),
        }
    }
}

/// Errors returned by `Interceptor::execute`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Forwarded verbatim, including an expiry that survived its one replay.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("session could not be renewed: {0}")]
    Refresh(#[from] RefreshError),

    /// A descriptor reached the recovery path twice. Indicates a bug.
    #[error(transparent)]
    AlreadyRetried(#[from] AlreadyRetried),
}

impl Error {
    /// The transport error, when the failure came straight from the server.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
