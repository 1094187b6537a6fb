//! Error types for ion-did core.

use thiserror::Error;

/// Errors raised by the pure DID primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A curve or algorithm tag that neither Ed25519 nor secp256k1 recognizes.
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// The log ends in a deactivate operation; nothing can follow it.
    #[error("cannot perform further operations on a deactivated DID")]
    TerminalState,

    /// The log has no create operation to link against.
    #[error("operation log has no create operation")]
    MissingCreate,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Key material that cannot be decoded for its declared curve.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A compact JWS that is not three well-formed base64url segments.
    #[error("malformed JWS: {0}")]
    MalformedJws(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    /// A reconstructed log that violates the lifecycle rules.
    #[error("invalid operation log: {0}")]
    InvalidLog(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Encoding(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
