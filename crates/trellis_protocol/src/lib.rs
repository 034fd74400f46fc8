//! # Trellis Protocol
//!
//! Entity model, envelopes and CBOR codecs for Trellis sync.
//!
//! This crate provides:
//! - `SyncEntity`, the versioned record replicated between client and server
//! - `DataType` and `EntitySpecifics`, the closed, type-tagged payload union
//! - Request/response envelopes (Authenticate, Commit, GetUpdates)
//! - CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod entity;
mod error;
mod messages;
mod specifics;

pub use codec::{from_cbor, to_cbor};
pub use entity::{SyncEntity, ROOT_ID, TOP_LEVEL_TAG};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    AuthenticateMessage, AuthenticateResponse, ClientToServerMessage, ClientToServerResponse,
    CommitMessage, CommitResponse, EntryResponse, GetUpdatesMessage, GetUpdatesResponse,
    MessageContents, ResponseContents, ResponseType, UserIdentity,
};
pub use specifics::{DataType, EntitySpecifics, PayloadSlots, TypeFilter, TypeTags};
