//! Account state: the versioned entity map.

use crate::ids::server_tag_to_id;
use crate::permanent::PERMANENT_ITEMS;
use crate::position::{place, Predecessor};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;
use trellis_protocol::{DataType, EntitySpecifics, SyncEntity};
use uuid::Uuid;

/// The state of the single sync account.
///
/// Holds every entity ever committed (tombstones included), the global
/// version counter, and the store birthday. All mutation goes through
/// [`AccountStore::commit_entry`](crate::AccountStore::commit_entry) and
/// the permanent item bootstrap, both of which end in [`Self::save`].
/// Entities cross the store boundary only as clones.
#[derive(Debug)]
pub struct AccountStore {
    /// Last assigned version. The next save takes this + 1.
    version: u64,
    /// Current snapshot of every entity, by id.
    entries: HashMap<String, SyncEntity>,
    /// Change log: sync timestamp -> id. One slot per entity.
    changes: BTreeMap<u64, String>,
    /// Identifies this lifetime of the store.
    store_birthday: String,
}

impl AccountStore {
    /// Creates an empty store with a random birthday.
    pub fn new() -> Self {
        Self::with_birthday(Uuid::new_v4().to_string())
    }

    /// Creates an empty store with the given birthday.
    pub fn with_birthday(store_birthday: impl Into<String>) -> Self {
        Self {
            version: 0,
            entries: HashMap::new(),
            changes: BTreeMap::new(),
            store_birthday: store_birthday.into(),
        }
    }

    /// Returns the store birthday.
    pub fn store_birthday(&self) -> &str {
        &self.store_birthday
    }

    /// Returns the last assigned version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of stored entities, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy of the stored entity.
    pub fn entity(&self, id: &str) -> Option<SyncEntity> {
        self.entries.get(id).cloned()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&SyncEntity> {
        self.entries.get(id)
    }

    /// Live (non-deleted) children of `parent_id`, unordered.
    pub(crate) fn live_children<'a>(
        &'a self,
        parent_id: &'a str,
    ) -> impl Iterator<Item = &'a SyncEntity> + 'a {
        self.entries
            .values()
            .filter(move |e| !e.deleted && e.parent_id_string.as_deref() == Some(parent_id))
    }

    /// Entities changed after `timestamp`, oldest first.
    pub(crate) fn changed_after(&self, timestamp: u64) -> impl Iterator<Item = &SyncEntity> {
        self.changes
            .range(timestamp.saturating_add(1)..)
            .filter_map(move |(_, id)| self.entries.get(id))
    }

    /// Stores an entity under a fresh version.
    ///
    /// The entity's version and sync timestamp are both set to the new
    /// counter value. Originator fields of an existing live entity are
    /// kept: they are set once, at creation.
    pub(crate) fn save(&mut self, mut entity: SyncEntity) -> SyncEntity {
        self.version += 1;
        entity.version = self.version;
        entity.sync_timestamp = self.version;

        if let Some(base) = self.entries.get(&entity.id_string) {
            self.changes.remove(&base.sync_timestamp);
            if !entity.deleted {
                entity.originator_cache_guid = base.originator_cache_guid.clone();
                entity.originator_client_item_id = base.originator_client_item_id.clone();
            }
        }

        self.changes.insert(entity.sync_timestamp, entity.id_string.clone());
        self.entries.insert(entity.id_string.clone(), entity.clone());
        entity
    }

    /// Creates the permanent items for `requested_types` that do not exist
    /// yet. Returns how many were created.
    pub fn ensure_permanent_items(&mut self, requested_types: &BTreeSet<DataType>) -> usize {
        let mut created = 0;
        for item in PERMANENT_ITEMS
            .iter()
            .filter(|item| requested_types.contains(&item.data_type))
        {
            let id = server_tag_to_id(item.tag);
            if self.entries.contains_key(&id) {
                continue;
            }
            info!(tag = item.tag, name = item.name, "creating permanent item");

            let parent_id = server_tag_to_id(item.parent_tag);
            let mut entity = SyncEntity {
                id_string: id,
                parent_id_string: Some(parent_id.clone()),
                folder: true,
                server_defined_unique_tag: Some(item.tag.to_string()),
                specifics: EntitySpecifics::default_for(item.data_type),
                ..SyncEntity::default()
            }
            .with_name(item.name);
            entity.position_in_parent = place(
                self.live_children(&parent_id),
                &entity.id_string,
                Predecessor::Last,
            );
            self.save(entity);
            created += 1;
        }
        created
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
