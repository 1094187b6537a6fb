//! Error types for DID state management.

use ion_did_core::CoreError;
use ion_did_net::NetError;
use thiserror::Error;

/// Errors that can occur while managing a DID.
#[derive(Debug, Error)]
pub enum DidError {
    /// A rule of the operation log, a key, or an encoding failed.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Resolution or anchoring failed.
    #[error("network error: {0}")]
    Net(#[from] NetError),

    /// The queue's worker is gone; nothing more can be enqueued.
    #[error("operation queue closed")]
    QueueClosed,

    /// A queued task panicked. The queue keeps running.
    #[error("queued task panicked")]
    TaskPanicked,

    /// The queue needs a Tokio runtime to spawn its worker.
    #[error("no Tokio runtime available")]
    NoRuntime,

    /// No operation at this index in the settled log.
    #[error("operation not found at index {0}")]
    OperationNotFound(usize),

    /// An external signer failed.
    #[error("signer error: {0}")]
    Signer(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing persisted state failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DidError {
    /// Whether this is the error for appending after a deactivate.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DidError::Core(CoreError::TerminalState))
    }

    /// Whether a curve tag was not recognized.
    pub fn is_unsupported_curve(&self) -> bool {
        matches!(self, DidError::Core(CoreError::UnsupportedCurve(_)))
    }
}

/// Result type for DID operations.
pub type Result<T> = std::result::Result<T, DidError>;
