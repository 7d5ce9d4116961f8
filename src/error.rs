use thiserror::Error;

/// Error taxonomy for the DMCFE core. Every fallible public operation
/// returns one of these; the core never silently recovers from a caller
/// mistake or a malformed peer message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DmcfeError {
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("required state not yet initialized: {0}")]
    StateMissing(&'static str),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("recovered inner product exceeds the discrete-log table bound")]
    BoundExceeded,

    #[error("discrete log not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, DmcfeError>;
