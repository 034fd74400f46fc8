//! Error types for the sync server.

use thiserror::Error;
use trellis_protocol::ProtocolError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that fail a whole request.
///
/// Per-entry commit conflicts are not errors at this level; they travel
/// inside a successful commit response.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Encoding, decoding or payload typing failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    ///
    /// Only a failure to encode the response is the server's fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::AuthenticationFailed(_) => true,
            ServerError::Protocol(err) => !matches!(err, ProtocolError::Encoding { .. }),
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Transport status for a request that failed with this error.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}
