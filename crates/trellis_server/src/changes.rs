//! Change-log queries.

use crate::store::AccountStore;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use trellis_protocol::{DataType, ProtocolResult, SyncEntity};

/// One page of the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Timestamp to resume from. Covers the whole scanned window, including
    /// changes filtered out of `entries`.
    pub new_timestamp: u64,
    /// Matching entities, oldest first.
    pub entries: Vec<SyncEntity>,
}

impl AccountStore {
    /// Returns the changes after `timestamp`, at most `batch_size` of them,
    /// restricted to `requested_types`.
    ///
    /// A query from timestamp zero first creates the permanent items for
    /// the requested types. Tombstones carry no type and are always
    /// returned. The window is cut before filtering, so a page may hold
    /// fewer entries than `batch_size` while more changes remain; callers
    /// keep asking until `new_timestamp` stops moving.
    ///
    /// # Errors
    ///
    /// Fails if a stored payload carries several type tags.
    pub fn changes_since(
        &mut self,
        requested_types: &BTreeSet<DataType>,
        timestamp: u64,
        batch_size: NonZeroUsize,
    ) -> ProtocolResult<ChangeBatch> {
        if timestamp == 0 {
            self.ensure_permanent_items(requested_types);
        }

        let window: Vec<&SyncEntity> = self
            .changed_after(timestamp)
            .take(batch_size.get())
            .collect();
        let Some(last) = window.last() else {
            return Ok(ChangeBatch {
                new_timestamp: timestamp,
                entries: Vec::new(),
            });
        };
        let new_timestamp = last.sync_timestamp;

        let mut entries = Vec::with_capacity(window.len());
        for entity in window {
            let wanted = entity.deleted
                || entity
                    .data_type()?
                    .is_some_and(|data_type| requested_types.contains(&data_type));
            if wanted {
                entries.push(entity.clone());
            }
        }

        Ok(ChangeBatch {
            new_timestamp,
            entries,
        })
    }
}
