//! Protocol error types.

use std::io;

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Encoded frame exceeds the maximum allowed size.
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the connection before sending any frame bytes.
    #[error("empty frame")]
    EmptyFrame,

    /// Operation timed out.
    #[error("timeout during {operation}")]
    Timeout { operation: String },
}

impl ProtocolError {
    /// Returns true if this error is an expired socket timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Io(err) => is_timeout(err),
            _ => false,
        }
    }
}

/// Returns true if `err` is what a blocking socket reports when its
/// read or write timeout expires.
///
/// Unix reports `WouldBlock` (EAGAIN), Windows reports `TimedOut`.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
