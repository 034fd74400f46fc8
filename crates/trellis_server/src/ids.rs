//! Server id generation.
//!
//! Ids come from three sources, each with its own prefix, so they occupy
//! disjoint textual namespaces and can never alias one another:
//! - server-defined tags of permanent items,
//! - client-defined tags, which make the id deterministic across sessions,
//! - a client's local id qualified by its cache guid.

use trellis_protocol::ROOT_ID;

const SERVER_TAG_PREFIX: &str = "<server tag>";
const CLIENT_TAG_PREFIX: &str = "<client tag>";
const CLIENT_ITEM_PREFIX: &str = "<server ID originally>";

/// Derives the id of a permanent item from its server-defined tag.
///
/// The root id and the empty tag map to themselves.
pub fn server_tag_to_id(tag: &str) -> String {
    if tag.is_empty() || tag == ROOT_ID {
        tag.to_string()
    } else {
        format!("{SERVER_TAG_PREFIX}{tag}")
    }
}

/// Derives the id of a client-tagged item.
pub fn client_tag_to_id(tag: &str) -> String {
    format!("{CLIENT_TAG_PREFIX}{tag}")
}

/// Derives the id of an item from the creating client's guid and local id.
pub fn client_item_to_id(cache_guid: &str, client_item_id: &str) -> String {
    format!("{CLIENT_ITEM_PREFIX}{cache_guid}/{client_item_id}")
}
