//! Client error types.

use std::io;

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
///
/// Every variant is recoverable: the caller gets a failure result, the
/// process keeps running.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Empty or malformed host, port or message. Raised before any I/O.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The host name could not be resolved.
    #[error("failed to resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    /// The connection was refused or otherwise failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// A connect, send or receive exceeded its timeout.
    #[error("timeout during {operation}")]
    Timeout { operation: String },

    /// Socket creation or option setting failed.
    #[error("socket error: {0}")]
    Socket(String),

    /// Framing error.
    #[error("protocol error: {0}")]
    Protocol(#[from] sockvar_protocol::ProtocolError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Responder failed to start or run.
    #[error("server error: {0}")]
    Server(String),
}

impl ClientError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Returns true for [`ClientError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<sockvar_server::ServerError> for ClientError {
    fn from(err: sockvar_server::ServerError) -> Self {
        Self::Server(err.to_string())
    }
}
