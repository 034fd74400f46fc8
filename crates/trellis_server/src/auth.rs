//! Authentication support for the sync server.
//!
//! Token verification is pluggable. The bundled [`StubAuthenticator`]
//! accepts every token and always answers with the configured identity,
//! which is all a single-account test server needs.

use crate::error::ServerResult;
use trellis_protocol::UserIdentity;

/// Maps an auth token to the signed-in user.
pub trait Authenticator: Send + Sync {
    /// Verifies `auth_token`.
    ///
    /// # Errors
    ///
    /// Implementations return [`crate::ServerError::AuthenticationFailed`]
    /// for tokens they reject.
    fn authenticate(&self, auth_token: &str) -> ServerResult<UserIdentity>;
}

/// Authenticator that accepts any token.
#[derive(Debug, Clone)]
pub struct StubAuthenticator {
    identity: UserIdentity,
}

impl StubAuthenticator {
    /// Creates an authenticator answering with `identity`.
    pub fn new(identity: UserIdentity) -> Self {
        Self { identity }
    }
}

impl Authenticator for StubAuthenticator {
    fn authenticate(&self, _auth_token: &str) -> ServerResult<UserIdentity> {
        Ok(self.identity.clone())
    }
}
