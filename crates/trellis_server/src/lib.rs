//! # Trellis Sync Server
//!
//! Single-account sync server for Trellis.
//!
//! This crate provides:
//! - The account store: every entity ever committed, a global version
//!   counter and the store birthday
//! - The commit pipeline (id assignment, optimistic concurrency, parent
//!   validation, sibling placement, tombstones)
//! - The change-log query behind GetUpdates, including permanent item
//!   bootstrap
//! - A request dispatcher and a lock-owning [`SyncServer`]
//!
//! # Architecture
//!
//! All state lives in one [`AccountStore`]. [`SyncServer`] wraps it in a
//! single mutex held for the whole of each request, so every request
//! observes and produces a consistent snapshot. Entities cross the store
//! boundary only as clones.
//!
//! ```rust,ignore
//! use trellis_server::{ServerConfig, SyncServer};
//!
//! let server = SyncServer::new(ServerConfig::default());
//! let (status, body) = server.handle_command(&request_bytes);
//! ```
//!
//! # Protocol
//!
//! 1. Client authenticates (any token is accepted by default)
//! 2. Client asks for updates from timestamp 0; permanent items for the
//!    requested types are created on the way
//! 3. Client commits local changes, batch by batch
//! 4. Client keeps asking for updates from the last returned timestamp

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod changes;
mod commit;
mod config;
mod error;
mod handler;
pub mod ids;
mod permanent;
pub mod position;
mod server;
mod store;

pub use auth::{Authenticator, StubAuthenticator};
pub use changes::ChangeBatch;
pub use commit::{CommitRejection, CommitSession};
pub use config::{ServerConfig, DEFAULT_BATCH_SIZE};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use permanent::{PermanentItem, PERMANENT_ITEMS};
pub use server::{SyncServer, STATUS_OK};
pub use store::AccountStore;
