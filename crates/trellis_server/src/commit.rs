//! The commit pipeline: validating and applying one client mutation.

use crate::ids;
use crate::position::{place, Predecessor};
use crate::store::AccountStore;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use trellis_protocol::{SyncEntity, ROOT_ID};

/// Client id -> server id remappings made earlier in one commit batch.
///
/// Later entries of a batch may refer to items created earlier in the same
/// batch by their client ids; the session rewrites those references.
#[derive(Debug, Default)]
pub struct CommitSession {
    remapped: HashMap<String, String>,
}

impl CommitSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the server id assigned to a client id in this session.
    pub fn server_id(&self, client_id: &str) -> Option<&str> {
        self.remapped.get(client_id).map(String::as_str)
    }

    fn record(&mut self, client_id: String, server_id: String) {
        self.remapped.insert(client_id, server_id);
    }

    fn rewrite(&self, id: &mut Option<String>) {
        if let Some(server_id) = id.as_deref().and_then(|client_id| self.remapped.get(client_id)) {
            *id = Some(server_id.clone());
        }
    }
}

/// Why a commit was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitRejection {
    /// The client has not seen the latest version.
    #[error("version conflict on {id}: client has {claimed}, server has {current}")]
    VersionMismatch {
        /// Entity id.
        id: String,
        /// Version the client claimed.
        claimed: u64,
        /// Version stored on the server.
        current: u64,
    },

    /// An edit (non-zero version) to an entity the server never stored.
    #[error("{id} does not exist, cannot apply edit of version {claimed}")]
    UnknownEntity {
        /// Entity id.
        id: String,
        /// Version the client claimed.
        claimed: u64,
    },

    /// The entity is a tombstone; deleted ids are never reused.
    #[error("{id} was deleted")]
    Deleted {
        /// Entity id.
        id: String,
    },

    /// No parent id was supplied.
    #[error("{id} has no parent")]
    MissingParent {
        /// Entity id.
        id: String,
    },

    /// The parent does not exist.
    #[error("parent {parent_id} of {id} does not exist")]
    UnknownParent {
        /// Entity id.
        id: String,
        /// Parent id.
        parent_id: String,
    },

    /// The entity names itself as parent.
    #[error("{id} cannot be its own parent")]
    SelfParent {
        /// Entity id.
        id: String,
    },

    /// The parent was deleted, typically by another client.
    #[error("parent {parent_id} of {id} was deleted")]
    DeletedParent {
        /// Entity id.
        id: String,
        /// Parent id.
        parent_id: String,
    },

    /// The parent is a leaf item.
    #[error("parent {parent_id} of {id} is not a folder")]
    NonFolderParent {
        /// Entity id.
        id: String,
        /// Parent id.
        parent_id: String,
    },
}

impl CommitRejection {
    /// Returns true for rejections a well-behaved client never triggers.
    ///
    /// Version conflicts and deleted parents arise from races between
    /// clients; the rest indicate a malformed commit.
    pub fn is_client_bug(&self) -> bool {
        matches!(
            self,
            CommitRejection::MissingParent { .. }
                | CommitRejection::UnknownParent { .. }
                | CommitRejection::SelfParent { .. }
                | CommitRejection::NonFolderParent { .. }
        )
    }
}

impl AccountStore {
    /// Attempts to commit one client entity.
    ///
    /// `cache_guid` identifies the committing client and feeds id
    /// generation for new items; `session` carries id remappings across the
    /// entries of one batch. On success the stored (canonical) entity is
    /// returned. A rejection leaves the store untouched, though the session
    /// may already hold the entity's new id.
    ///
    /// # Errors
    ///
    /// Returns a [`CommitRejection`] when the version check or the parent
    /// check fails.
    pub fn commit_entry(
        &mut self,
        entry: &SyncEntity,
        cache_guid: &str,
        session: &mut CommitSession,
    ) -> Result<SyncEntity, CommitRejection> {
        let mut entry = entry.clone();

        rewrite_ids_as_server_ids(&mut entry, cache_guid, session);
        self.check_version(&entry)?;
        // TODO: detect multi-hop parent cycles; only self-parenting is caught.
        self.check_parent(&entry)?;

        let entry = if entry.deleted {
            SyncEntity::tombstone(entry.id_string)
        } else {
            let parent_id = entry.parent_id_string.clone().unwrap_or_default();
            entry.position_in_parent = place(
                self.live_children(&parent_id),
                &entry.id_string,
                Predecessor::for_entity(&entry),
            );
            entry.insert_after_item_id = None;
            entry
        };

        let stored = self.save(entry);
        debug!(
            id = %stored.id_string,
            version = stored.version,
            deleted = stored.deleted,
            "committed entity"
        );
        Ok(stored)
    }

    /// Optimistic concurrency check.
    fn check_version(&self, entry: &SyncEntity) -> Result<(), CommitRejection> {
        let id = &entry.id_string;
        match self.get(id) {
            Some(stored) if stored.deleted => Err(CommitRejection::Deleted { id: id.clone() }),
            Some(stored) if stored.version != entry.version => {
                Err(CommitRejection::VersionMismatch {
                    id: id.clone(),
                    claimed: entry.version,
                    current: stored.version,
                })
            }
            Some(_) => Ok(()),
            None if entry.version != 0 => Err(CommitRejection::UnknownEntity {
                id: id.clone(),
                claimed: entry.version,
            }),
            None => Ok(()),
        }
    }

    fn check_parent(&self, entry: &SyncEntity) -> Result<(), CommitRejection> {
        let id = entry.id_string.clone();
        let Some(parent_id) = entry.parent_id_string.clone() else {
            return Err(CommitRejection::MissingParent { id });
        };
        if parent_id == ROOT_ID {
            return Ok(());
        }
        if parent_id == id {
            return Err(CommitRejection::SelfParent { id });
        }
        match self.get(&parent_id) {
            None => Err(CommitRejection::UnknownParent { id, parent_id }),
            Some(parent) if parent.deleted => Err(CommitRejection::DeletedParent { id, parent_id }),
            Some(parent) if !parent.folder => {
                Err(CommitRejection::NonFolderParent { id, parent_id })
            }
            Some(_) => Ok(()),
        }
    }
}

/// Assigns a server id to a new entity and rewrites references to items
/// created earlier in the batch.
fn rewrite_ids_as_server_ids(entry: &mut SyncEntity, cache_guid: &str, session: &mut CommitSession) {
    if entry.version == 0 {
        let client_id = std::mem::take(&mut entry.id_string);
        let server_id = match entry.client_defined_unique_tag.as_deref() {
            Some(tag) => ids::client_tag_to_id(tag),
            None => ids::client_item_to_id(cache_guid, &client_id),
        };
        entry.originator_cache_guid = Some(cache_guid.to_string());
        entry.originator_client_item_id = Some(client_id.clone());
        session.record(client_id, server_id.clone());
        entry.id_string = server_id;
    }
    session.rewrite(&mut entry.parent_id_string);
    session.rewrite(&mut entry.insert_after_item_id);
}
