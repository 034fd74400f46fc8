//! Server configuration.

use std::num::NonZeroUsize;
use trellis_protocol::UserIdentity;

/// Default number of changes scanned per GetUpdates request.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of change-log entries scanned per GetUpdates.
    /// Never zero, so every page past unread changes moves forward.
    pub batch_size: NonZeroUsize,
    /// Identity returned by the authenticator.
    pub identity: UserIdentity,
    /// Fixed store birthday. A random one is generated when absent.
    pub store_birthday: Option<String>,
}

impl ServerConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            identity: UserIdentity {
                email: "sync-user@localhost".into(),
                display_name: "Sync User".into(),
            },
            store_birthday: None,
        }
    }

    /// Sets the GetUpdates batch size.
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the identity returned to authenticating clients.
    pub fn with_identity(mut self, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.identity = UserIdentity {
            email: email.into(),
            display_name: display_name.into(),
        };
        self
    }

    /// Pins the store birthday.
    pub fn with_store_birthday(mut self, store_birthday: impl Into<String>) -> Self {
        self.store_birthday = Some(store_birthday.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
