//! Main sync server.

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use crate::store::AccountStore;
use parking_lot::Mutex;
use tracing::warn;
use trellis_protocol::{ClientToServerMessage, ClientToServerResponse, SyncEntity};

/// Transport status for a handled request.
pub const STATUS_OK: u16 = 200;

/// The sync server.
///
/// Owns the single account and serializes every request on one lock,
/// held from decoding the request to encoding the response. Callers may
/// share the server across threads freely.
///
/// # Example
///
/// ```
/// use trellis_server::{ServerConfig, SyncServer};
/// use trellis_protocol::{ClientToServerMessage, DataType, TypeFilter};
///
/// let server = SyncServer::new(ServerConfig::default());
/// let request = ClientToServerMessage::get_updates(0, TypeFilter::of([DataType::Bookmark]));
///
/// let (status, body) = server.handle_command(&request.encode().unwrap());
/// assert_eq!(status, 200);
/// assert!(!body.is_empty());
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    account: Mutex<AccountStore>,
}

impl SyncServer {
    /// Creates a new sync server with an empty account.
    pub fn new(config: ServerConfig) -> Self {
        let account = match &config.store_birthday {
            Some(birthday) => AccountStore::with_birthday(birthday.clone()),
            None => AccountStore::new(),
        };
        Self::with_account(config, account)
    }

    /// Creates a sync server around an existing account.
    pub fn with_account(config: ServerConfig, account: AccountStore) -> Self {
        Self {
            handler: RequestHandler::new(config),
            account: Mutex::new(account),
        }
    }

    /// Replaces the authenticator.
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.handler = self.handler.with_authenticator(authenticator);
        self
    }

    /// Handles a typed request.
    ///
    /// # Errors
    ///
    /// See [`RequestHandler::handle`].
    pub fn handle_message(
        &self,
        message: ClientToServerMessage,
    ) -> ServerResult<ClientToServerResponse> {
        let mut account = self.account.lock();
        self.handler.handle(&mut account, message)
    }

    /// Handles an encoded request and returns the transport status and the
    /// encoded response.
    ///
    /// Any failure yields its status code with an empty body.
    pub fn handle_command(&self, request: &[u8]) -> (u16, Vec<u8>) {
        let mut account = self.account.lock();
        let result = ClientToServerMessage::decode(request)
            .map_err(Into::into)
            .and_then(|message| self.handler.handle(&mut account, message))
            .and_then(|response| response.encode().map_err(Into::into));

        match result {
            Ok(body) => (STATUS_OK, body),
            Err(err) => {
                warn!(error = %err, "request failed");
                (err.status_code(), Vec::new())
            }
        }
    }

    /// Returns the store birthday.
    pub fn store_birthday(&self) -> String {
        self.account.lock().store_birthday().to_string()
    }

    /// Returns the last assigned version.
    pub fn version(&self) -> u64 {
        self.account.lock().version()
    }

    /// Returns the number of stored entities, tombstones included.
    pub fn entity_count(&self) -> usize {
        self.account.lock().len()
    }

    /// Returns a snapshot of one stored entity.
    pub fn entity(&self, id: &str) -> Option<SyncEntity> {
        self.account.lock().entity(id)
    }
}
