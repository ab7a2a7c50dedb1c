//! Error types for ticker-sync.

use thiserror::Error;

/// The main error type for ticker-sync.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure: connection refused, timeout, undecodable body.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The remote source answered with a non-2xx status and an error body.
    #[error("Remote rejected request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// The symbol is already a member of the tracked set.
    #[error("{0} is already tracked")]
    AlreadyTracked(String),

    /// The symbol is not a member of the tracked set.
    #[error("{0} is not tracked")]
    NotTracked(String),

    /// No persisted mirror of the tracked set exists yet.
    #[error("No persisted tracked-symbol mirror")]
    PersistedMirrorMissing,

    /// The symbol is empty after normalization.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// IO errors (mirror file, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkUnavailable(msg.into())
    }

    /// Create a new remote rejection.
    pub fn rejected(status: u16, msg: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: msg.into(),
        }
    }

    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status of a remote rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote source could not be reached or refused the request.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable(_) | Self::RemoteRejected { .. }
        )
    }

    /// Check if this error is recoverable (user can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status() {
        let err = Error::rejected(404, "Stock not found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_remote_failure());
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Remote rejected request (404): Stock not found"
        );
    }

    #[test]
    fn test_network_is_recoverable() {
        let err = Error::network("connection refused");
        assert!(err.is_recoverable());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_local_errors_are_not_remote() {
        assert!(!Error::AlreadyTracked("PAWN".into()).is_remote_failure());
        assert!(!Error::NotTracked("PAWN".into()).is_remote_failure());
        assert!(!Error::PersistedMirrorMissing.is_remote_failure());
    }
}
