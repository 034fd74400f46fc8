//! Request and response envelopes.

use crate::codec::{from_cbor, to_cbor};
use crate::entity::SyncEntity;
use crate::error::ProtocolResult;
use crate::specifics::TypeFilter;
use serde::{Deserialize, Serialize};

/// A request from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientToServerMessage {
    /// Account the request is addressed to. Informational only.
    #[serde(default)]
    pub share: String,
    /// The request body; its variant is the envelope kind.
    pub contents: MessageContents,
}

/// The kind-specific body of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContents {
    /// Sign in.
    Authenticate(AuthenticateMessage),
    /// Commit a batch of entities.
    Commit(CommitMessage),
    /// Fetch changes since a timestamp.
    GetUpdates(GetUpdatesMessage),
}

impl MessageContents {
    /// Returns the envelope kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContents::Authenticate(_) => "AUTHENTICATE",
            MessageContents::Commit(_) => "COMMIT",
            MessageContents::GetUpdates(_) => "GET_UPDATES",
        }
    }
}

impl ClientToServerMessage {
    /// Creates a request addressed to `share`.
    pub fn new(share: impl Into<String>, contents: MessageContents) -> Self {
        Self {
            share: share.into(),
            contents,
        }
    }

    /// Creates an authenticate request.
    pub fn authenticate(auth_token: impl Into<String>) -> Self {
        Self::new(
            "",
            MessageContents::Authenticate(AuthenticateMessage {
                auth_token: auth_token.into(),
            }),
        )
    }

    /// Creates a commit request.
    pub fn commit(cache_guid: impl Into<String>, entries: Vec<SyncEntity>) -> Self {
        Self::new(
            "",
            MessageContents::Commit(CommitMessage {
                cache_guid: cache_guid.into(),
                entries,
            }),
        )
    }

    /// Creates a get-updates request.
    pub fn get_updates(from_timestamp: u64, requested_types: TypeFilter) -> Self {
        Self::new(
            "",
            MessageContents::GetUpdates(GetUpdatesMessage {
                from_timestamp,
                requested_types,
            }),
        )
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

/// Authenticate request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateMessage {
    /// Credential. Any value is accepted.
    #[serde(default)]
    pub auth_token: String,
}

/// Commit request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// Globally unique id of the committing client.
    pub cache_guid: String,
    /// Entities to commit, in order.
    #[serde(default)]
    pub entries: Vec<SyncEntity>,
}

/// GetUpdates request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUpdatesMessage {
    /// Only changes newer than this are returned. Zero means "from scratch".
    #[serde(default)]
    pub from_timestamp: u64,
    /// Data types the client wants.
    #[serde(default)]
    pub requested_types: TypeFilter,
}

/// A response to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientToServerResponse {
    /// Identifies one lifetime of the server's account store. A change
    /// tells the client to resynchronize from timestamp zero.
    pub store_birthday: String,
    /// The response body, matching the request kind.
    pub contents: ResponseContents,
}

/// The kind-specific body of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseContents {
    /// Reply to an authenticate request.
    Authenticate(AuthenticateResponse),
    /// Reply to a commit request.
    Commit(CommitResponse),
    /// Reply to a get-updates request.
    GetUpdates(GetUpdatesResponse),
}

impl ClientToServerResponse {
    /// Creates a response.
    pub fn new(store_birthday: impl Into<String>, contents: ResponseContents) -> Self {
        Self {
            store_birthday: store_birthday.into(),
            contents,
        }
    }

    /// Returns the commit body, if this is a commit response.
    pub fn as_commit(&self) -> Option<&CommitResponse> {
        match &self.contents {
            ResponseContents::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    /// Returns the get-updates body, if this is a get-updates response.
    pub fn as_get_updates(&self) -> Option<&GetUpdatesResponse> {
        match &self.contents {
            ResponseContents::GetUpdates(updates) => Some(updates),
            _ => None,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Account email.
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
}

/// Authenticate response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    /// The authenticated user.
    pub user: UserIdentity,
}

/// Result of committing one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    /// The entry was committed.
    Success,
    /// The entry was rejected, or not attempted after an earlier rejection.
    Conflict,
}

/// Commit response body: one entry per committed entity, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Per-entry results.
    pub entry_responses: Vec<EntryResponse>,
}

/// The server's verdict on one committed entity.
///
/// On success the fields the server may override are reported back; a
/// tombstone reports only its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResponse {
    /// Outcome.
    pub response_type: ResponseType,
    /// Post-commit server id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_string: Option<String>,
    /// Post-commit parent id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id_string: Option<String>,
    /// Post-commit absolute position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_in_parent: Option<i64>,
    /// Post-commit version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Post-commit name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Post-commit display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_unique_name: Option<String>,
    /// Reason for a conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EntryResponse {
    /// Builds a success entry from the stored entity.
    pub fn success(entity: &SyncEntity) -> Self {
        let mut response = Self {
            response_type: ResponseType::Success,
            id_string: Some(entity.id_string.clone()),
            parent_id_string: None,
            position_in_parent: None,
            version: None,
            name: None,
            non_unique_name: None,
            error_message: None,
        };
        if !entity.deleted {
            response.parent_id_string = entity.parent_id_string.clone();
            response.position_in_parent = Some(entity.position_in_parent);
            response.version = Some(entity.version);
            response.name = Some(entity.name.clone());
            response.non_unique_name = Some(entity.non_unique_name.clone());
        }
        response
    }

    /// Builds a conflict entry.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Conflict,
            id_string: None,
            parent_id_string: None,
            position_in_parent: None,
            version: None,
            name: None,
            non_unique_name: None,
            error_message: Some(message.into()),
        }
    }

    /// Returns true if the entry was committed.
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }
}

/// GetUpdates response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUpdatesResponse {
    /// Timestamp to resume from. Absent when nothing newer existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_timestamp: Option<u64>,
    /// Changed entities, oldest first.
    #[serde(default)]
    pub entries: Vec<SyncEntity>,
}
