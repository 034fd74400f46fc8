//! The sync entity record.

use crate::error::ProtocolResult;
use crate::specifics::{DataType, EntitySpecifics, TypeTags};
use serde::{Deserialize, Serialize};

/// Parent id of a top-level node.
pub const ROOT_ID: &str = "0";

/// Server-defined tag of the top-level container.
pub const TOP_LEVEL_TAG: &str = "top_level";

/// One syncable object: a folder or a leaf item.
///
/// The same record is used in both directions. In a commit the client
/// fills in `insert_after_item_id` to express ordering; the server converts
/// that into an absolute `position_in_parent` and clears it before the
/// entity is stored or echoed back.
///
/// Fields at their defaults are left off the wire, so a tombstone encodes
/// as its id, version, timestamp, deleted flag and empty name only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntity {
    /// Entity id. Client-local for new items, server-assigned afterwards.
    pub id_string: String,
    /// Id of the parent folder, or [`ROOT_ID`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id_string: Option<String>,
    /// Server version. Zero means "never committed".
    #[serde(default)]
    pub version: u64,
    /// Sortable key among siblings.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub position_in_parent: i64,
    /// Predecessor sibling for commits: absent appends, empty inserts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after_item_id: Option<String>,
    /// Whether this entity may be a parent.
    #[serde(default, skip_serializing_if = "is_false")]
    pub folder: bool,
    /// Tombstone flag.
    #[serde(default)]
    pub deleted: bool,
    /// Name. Mandatory on the wire, so tombstones carry an empty string.
    #[serde(default)]
    pub name: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub non_unique_name: String,
    /// Tag of a server-created permanent item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_defined_unique_tag: Option<String>,
    /// Stable, client-chosen tag that determines the server id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_defined_unique_tag: Option<String>,
    /// Cache guid of the client that created this entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator_cache_guid: Option<String>,
    /// The creating client's local id for this entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator_client_item_id: Option<String>,
    /// Type-tagged payload.
    #[serde(default, skip_serializing_if = "EntitySpecifics::is_untyped")]
    pub specifics: EntitySpecifics,
    /// Change-log ordering key; equal to `version` once stored.
    #[serde(default)]
    pub sync_timestamp: u64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SyncEntity {
    /// Creates an uncommitted entity with the given client id and parent.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id_string: id.into(),
            parent_id_string: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// Creates the minimal record retained for a deleted entity.
    pub fn tombstone(id: impl Into<String>) -> Self {
        Self {
            id_string: id.into(),
            deleted: true,
            ..Self::default()
        }
    }

    /// Sets both name fields.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.non_unique_name = name.clone();
        self.name = name;
        self
    }

    /// Marks the entity as a folder.
    pub fn with_folder(mut self, folder: bool) -> Self {
        self.folder = folder;
        self
    }

    /// Sets the claimed version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Sets the predecessor sibling.
    pub fn with_insert_after(mut self, predecessor: impl Into<String>) -> Self {
        self.insert_after_item_id = Some(predecessor.into());
        self
    }

    /// Sets the client-defined tag.
    pub fn with_client_tag(mut self, tag: impl Into<String>) -> Self {
        self.client_defined_unique_tag = Some(tag.into());
        self
    }

    /// Sets the payload.
    pub fn with_specifics(mut self, specifics: EntitySpecifics) -> Self {
        self.specifics = specifics;
        self
    }

    /// Marks the entity deleted.
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// Infers the entity's data type.
    ///
    /// The top-level container is recognized by its server tag; everything
    /// else is typed by its payload. Tombstones have no type.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ProtocolError::MultipleTypeTags`] from the payload.
    pub fn data_type(&self) -> ProtocolResult<Option<DataType>> {
        if self.server_defined_unique_tag.as_deref() == Some(TOP_LEVEL_TAG) {
            return Ok(Some(DataType::TopLevel));
        }
        self.specifics.single_type_tag()
    }
}
