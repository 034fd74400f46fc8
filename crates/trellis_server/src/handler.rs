//! Request handlers for the three envelope kinds.

use crate::auth::{Authenticator, StubAuthenticator};
use crate::commit::CommitSession;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::store::AccountStore;
use tracing::{debug, info, warn};
use trellis_protocol::{
    AuthenticateMessage, AuthenticateResponse, ClientToServerMessage, ClientToServerResponse,
    CommitMessage, CommitResponse, EntryResponse, GetUpdatesMessage, GetUpdatesResponse,
    MessageContents, ResponseContents,
};

/// Message used for batch entries skipped after an earlier conflict.
const NOT_ATTEMPTED: &str = "not attempted: an earlier entry in the batch conflicted";

/// Handler for sync requests.
///
/// Stateless apart from configuration: the account is passed in by the
/// caller, which is responsible for serializing access to it.
pub struct RequestHandler {
    config: ServerConfig,
    authenticator: Box<dyn Authenticator>,
}

impl RequestHandler {
    /// Creates a handler using the stub authenticator.
    pub fn new(config: ServerConfig) -> Self {
        let authenticator = Box::new(StubAuthenticator::new(config.identity.clone()));
        Self {
            config,
            authenticator,
        }
    }

    /// Replaces the authenticator.
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Box::new(authenticator);
        self
    }

    /// Dispatches one request against `account`.
    ///
    /// # Errors
    ///
    /// Fails when authentication is refused or a stored payload is
    /// malformed. Commit conflicts are reported inside the response.
    pub fn handle(
        &self,
        account: &mut AccountStore,
        message: ClientToServerMessage,
    ) -> ServerResult<ClientToServerResponse> {
        let contents = match message.contents {
            MessageContents::Authenticate(request) => {
                info!("authenticate");
                ResponseContents::Authenticate(self.handle_authenticate(&request)?)
            }
            MessageContents::Commit(request) => {
                info!(cache_guid = %request.cache_guid, entries = request.entries.len(), "commit");
                ResponseContents::Commit(self.handle_commit(account, &request))
            }
            MessageContents::GetUpdates(request) => {
                info!(from_timestamp = request.from_timestamp, "get updates");
                ResponseContents::GetUpdates(self.handle_get_updates(account, &request)?)
            }
        };
        Ok(ClientToServerResponse::new(
            account.store_birthday(),
            contents,
        ))
    }

    /// Handles an authenticate request.
    pub fn handle_authenticate(
        &self,
        request: &AuthenticateMessage,
    ) -> ServerResult<AuthenticateResponse> {
        let user = self.authenticator.authenticate(&request.auth_token)?;
        Ok(AuthenticateResponse { user })
    }

    /// Handles a commit request.
    ///
    /// Entries are applied in order. After the first conflict the remaining
    /// entries are reported as conflicts without being looked at; entries
    /// already applied stay applied.
    pub fn handle_commit(&self, account: &mut AccountStore, request: &CommitMessage) -> CommitResponse {
        let mut session = CommitSession::new();
        let mut failed = false;
        let mut entry_responses = Vec::with_capacity(request.entries.len());

        for entry in &request.entries {
            if failed {
                entry_responses.push(EntryResponse::conflict(NOT_ATTEMPTED));
                continue;
            }
            match account.commit_entry(entry, &request.cache_guid, &mut session) {
                Ok(stored) => entry_responses.push(EntryResponse::success(&stored)),
                Err(rejection) => {
                    if rejection.is_client_bug() {
                        warn!(id = %entry.id_string, error = %rejection, "rejected malformed commit");
                    } else {
                        debug!(id = %entry.id_string, error = %rejection, "commit conflict");
                    }
                    failed = true;
                    entry_responses.push(EntryResponse::conflict(rejection.to_string()));
                }
            }
        }

        CommitResponse { entry_responses }
    }

    /// Handles a GetUpdates request.
    ///
    /// # Errors
    ///
    /// Fails if a stored payload carries several type tags.
    pub fn handle_get_updates(
        &self,
        account: &mut AccountStore,
        request: &GetUpdatesMessage,
    ) -> ServerResult<GetUpdatesResponse> {
        let requested = request.requested_types.requested_types();
        let batch = account.changes_since(&requested, request.from_timestamp, self.config.batch_size)?;

        if batch.new_timestamp == request.from_timestamp {
            return Ok(GetUpdatesResponse::default());
        }
        Ok(GetUpdatesResponse {
            new_timestamp: Some(batch.new_timestamp),
            entries: batch.entries,
        })
    }
}
