//! Error types for resolution and anchoring.

use thiserror::Error;

/// Errors from the network-facing collaborators.
///
/// Nothing here is retried internally; callers decide whether a failure is
/// worth another attempt.
#[derive(Debug, Error)]
pub enum NetError {
    /// The resolver answered 404 for this DID.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// Any other status of 400 or above.
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but its body was not the expected JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl NetError {
    /// The HTTP status behind this error, if there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetError::NotFound(_) => Some(404),
            NetError::Status { code, .. } => Some(*code),
            NetError::Transport(_) | NetError::InvalidResponse(_) => None,
        }
    }
}

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, NetError>;
