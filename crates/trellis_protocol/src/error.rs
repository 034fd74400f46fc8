//! Error types for the protocol crate.

use crate::specifics::DataType;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while building or coding protocol messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Failed to encode a message to CBOR.
    #[error("encoding failed: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes into a message.
    #[error("decoding failed: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },

    /// An entity payload carried more than one type tag.
    #[error("expected at most one type tag on an entity payload, found {found:?}")]
    MultipleTypeTags {
        /// The tags that were present.
        found: Vec<DataType>,
    },

    /// A payload slot was supplied for a type that has none.
    #[error("data type {0:?} carries no payload")]
    PayloadlessType(DataType),
}

impl ProtocolError {
    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }
}
