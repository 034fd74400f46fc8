//! CBOR encoding for protocol envelopes.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to CBOR bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Encoding`] if serialization fails.
pub fn to_cbor<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| ProtocolError::encoding(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a value from CBOR bytes.
///
/// Payload invariants checked during deserialization (such as the single
/// type tag on an entity) surface here as [`ProtocolError::Decoding`].
///
/// # Errors
///
/// Returns [`ProtocolError::Decoding`] on malformed or mistyped input.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::from_reader(bytes).map_err(|e| ProtocolError::decoding(e.to_string()))
}
