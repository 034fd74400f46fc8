//! Integration tests driving the sync server through its request surface.

use proptest::prelude::*;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use trellis_protocol::{
    ClientToServerMessage, ClientToServerResponse, CommitResponse, DataType, EntitySpecifics,
    GetUpdatesResponse, ResponseType, SyncEntity, TypeFilter, ROOT_ID,
};
use trellis_server::ids::{client_tag_to_id, server_tag_to_id};
use trellis_server::{ServerConfig, SyncServer};

/// A client talking to an in-process server over encoded bytes.
struct TestClient {
    server: Arc<SyncServer>,
    cache_guid: String,
}

impl TestClient {
    fn new(server: Arc<SyncServer>, cache_guid: &str) -> Self {
        Self {
            server,
            cache_guid: cache_guid.into(),
        }
    }

    fn send(&self, message: &ClientToServerMessage) -> ClientToServerResponse {
        let (status, body) = self.server.handle_command(&message.encode().unwrap());
        assert_eq!(status, 200);
        ClientToServerResponse::decode(&body).unwrap()
    }

    fn commit(&self, entries: Vec<SyncEntity>) -> CommitResponse {
        let message = ClientToServerMessage::commit(self.cache_guid.clone(), entries);
        self.send(&message).as_commit().cloned().unwrap()
    }

    fn get_updates(&self, from_timestamp: u64, types: &[DataType]) -> GetUpdatesResponse {
        let message =
            ClientToServerMessage::get_updates(from_timestamp, TypeFilter::of(types.iter().copied()));
        self.send(&message).as_get_updates().cloned().unwrap()
    }
}

fn bookmark(id: &str, parent: &str, name: &str) -> SyncEntity {
    SyncEntity::new(id, parent)
        .with_name(name)
        .with_specifics(EntitySpecifics::default_for(DataType::Bookmark))
}

fn setup() -> (Arc<SyncServer>, TestClient) {
    let server = Arc::new(SyncServer::new(
        ServerConfig::default().with_store_birthday("birthday"),
    ));
    let client = TestClient::new(Arc::clone(&server), "client-a");
    (server, client)
}

/// Bootstraps bookmarks and returns the bookmark bar id.
fn bookmark_bar(client: &TestClient) -> String {
    client.get_updates(0, &[DataType::Bookmark]);
    server_tag_to_id("bookmark_bar")
}

#[test]
fn every_response_echoes_the_birthday() {
    let (_, client) = setup();
    let messages = [
        ClientToServerMessage::authenticate("token"),
        ClientToServerMessage::get_updates(0, TypeFilter::default()),
        ClientToServerMessage::commit("guid", Vec::new()),
    ];
    for message in &messages {
        assert_eq!(client.send(message).store_birthday, "birthday");
    }
}

#[test]
fn versions_are_global_and_strictly_increasing() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);
    let base = server.version();

    let response = client.commit(vec![
        bookmark("-1", &bar, "a"),
        bookmark("-2", &bar, "b"),
    ]);
    let a_id = response.entry_responses[0].id_string.clone().unwrap();
    assert_eq!(response.entry_responses[0].version, Some(base + 1));
    assert_eq!(response.entry_responses[1].version, Some(base + 2));

    let mut a = server.entity(&a_id).unwrap();
    let mut versions = vec![a.version];
    for n in 0..3 {
        a.name = format!("edit {n}");
        let response = client.commit(vec![a.clone()]);
        let version = response.entry_responses[0].version.unwrap();
        versions.push(version);
        a.version = version;
    }
    assert!(versions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(server.version(), base + 5);
}

#[test]
fn stale_commit_conflicts_and_changes_nothing() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);

    let response = client.commit(vec![bookmark("-1", &bar, "original")]);
    let id = response.entry_responses[0].id_string.clone().unwrap();
    let stored = server.entity(&id).unwrap();

    let other = TestClient::new(Arc::clone(&server), "client-b");
    let response = other.commit(vec![stored.clone().with_name("from b")]);
    assert!(response.entry_responses[0].is_success());
    let after_b = server.entity(&id).unwrap();

    let response = client.commit(vec![stored.with_name("from a")]);
    assert_eq!(response.entry_responses[0].response_type, ResponseType::Conflict);
    assert_eq!(server.entity(&id).unwrap(), after_b);
}

#[test]
fn tombstoned_ids_stay_dead() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);

    let response = client.commit(vec![bookmark("-1", &bar, "doomed")]);
    let id = response.entry_responses[0].id_string.clone().unwrap();
    let stored = server.entity(&id).unwrap();

    let response = client.commit(vec![stored.with_deleted(true)]);
    let entry = &response.entry_responses[0];
    assert!(entry.is_success());
    assert_eq!(entry.id_string.as_deref(), Some(id.as_str()));
    assert!(entry.version.is_none());

    // Same client id from the same client resolves to the same server id.
    let response = client.commit(vec![bookmark("-1", &bar, "resurrected")]);
    assert_eq!(response.entry_responses[0].response_type, ResponseType::Conflict);

    let tomb = server.entity(&id).unwrap();
    assert!(tomb.deleted);
    assert!(tomb.name.is_empty());
}

#[test]
fn tombstones_reach_every_filter() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);
    let response = client.commit(vec![bookmark("-1", &bar, "x")]);
    let id = response.entry_responses[0].id_string.clone().unwrap();
    let timestamp = server.version();

    client.commit(vec![server.entity(&id).unwrap().with_deleted(true)]);

    let updates = client.get_updates(timestamp, &[DataType::Theme]);
    assert_eq!(updates.entries.len(), 1);
    assert!(updates.entries[0].deleted);
    assert_eq!(updates.entries[0].id_string, id);
}

#[test]
fn client_tag_resolves_to_the_same_id_across_sessions() {
    let (server, client) = setup();
    client.get_updates(0, &[DataType::Preference]);
    let container = server_tag_to_id("preferences");

    let pref = |client_id: &str| {
        SyncEntity::new(client_id, container.clone())
            .with_client_tag("homepage")
            .with_specifics(EntitySpecifics::default_for(DataType::Preference))
    };

    let first = client.commit(vec![pref("-1")]);
    let first_id = first.entry_responses[0].id_string.clone().unwrap();
    assert_eq!(first_id, client_tag_to_id("homepage"));

    // A second client creating the same tagged item lands on the tag's id
    // and must use the stored version.
    let other = TestClient::new(Arc::clone(&server), "client-b");
    let count = server.entity_count();
    let second = other.commit(vec![pref("-9")]);
    assert_eq!(second.entry_responses[0].response_type, ResponseType::Conflict);
    let message = second.entry_responses[0].error_message.clone().unwrap();
    assert!(message.contains(&first_id), "{message}");
    assert_eq!(server.entity_count(), count);

    // Editing through the server id with the current version succeeds.
    let version = first.entry_responses[0].version.unwrap();
    let third = other.commit(vec![pref(&first_id).with_version(version)]);
    assert_eq!(third.entry_responses[0].id_string.as_deref(), Some(first_id.as_str()));

    let stored = server.entity(&first_id).unwrap();
    assert_eq!(stored.originator_cache_guid.as_deref(), Some("client-a"));
    assert_eq!(stored.originator_client_item_id.as_deref(), Some("-1"));
}

#[test]
fn batch_fails_fast_after_first_conflict() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);

    let response = client.commit(vec![bookmark("-1", &bar, "existing")]);
    let existing_id = response.entry_responses[0].id_string.clone().unwrap();
    let stale = server.entity(&existing_id).unwrap().with_version(99);
    let before = server.version();

    let response = client.commit(vec![
        bookmark("-2", &bar, "first"),
        stale,
        bookmark("-3", &bar, "third"),
    ]);
    let results: Vec<ResponseType> = response
        .entry_responses
        .iter()
        .map(|r| r.response_type)
        .collect();
    assert_eq!(
        results,
        vec![ResponseType::Success, ResponseType::Conflict, ResponseType::Conflict]
    );

    // The first entry stays committed; the third never reached the store.
    assert_eq!(server.version(), before + 1);
    let third_id = trellis_server::ids::client_item_to_id("client-a", "-3");
    assert!(server.entity(&third_id).is_none());
}

#[test]
fn batch_may_reference_items_created_earlier_in_it() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);

    let folder = bookmark("-10", &bar, "folder").with_folder(true);
    let child = bookmark("-11", "-10", "child");
    let sibling = bookmark("-12", "-10", "first").with_insert_after("");
    let response = client.commit(vec![folder, child, sibling]);
    assert!(response.entry_responses.iter().all(|r| r.is_success()));

    let folder_id = response.entry_responses[0].id_string.clone().unwrap();
    let child = server.entity(response.entry_responses[1].id_string.as_deref().unwrap()).unwrap();
    let first = server.entity(response.entry_responses[2].id_string.as_deref().unwrap()).unwrap();
    assert_eq!(child.parent_id_string.as_deref(), Some(folder_id.as_str()));
    assert!(first.position_in_parent < child.position_in_parent);
    assert!(child.insert_after_item_id.is_none());
}

#[test]
fn bootstrap_happens_once() {
    let (server, client) = setup();
    let first = client.get_updates(0, &[DataType::Bookmark, DataType::Theme]);
    let created = server.entity_count();
    assert_eq!(created, 5);
    assert_eq!(first.entries.len(), 5);

    let second = client.get_updates(0, &[DataType::Bookmark, DataType::Theme]);
    assert_eq!(server.entity_count(), created);
    assert_eq!(second.entries, first.entries);

    let tag = |e: &SyncEntity| e.server_defined_unique_tag.clone().unwrap();
    let mut tags: Vec<String> = first.entries.iter().map(tag).collect();
    tags.sort();
    assert_eq!(
        tags,
        vec!["bookmark_bar", "bookmarks", "other_bookmarks", "themes", "top_level"]
    );
}

#[test]
fn nothing_new_omits_the_timestamp() {
    let (server, client) = setup();
    client.get_updates(0, &[DataType::Bookmark]);
    let updates = client.get_updates(server.version(), &[DataType::Bookmark]);
    assert!(updates.new_timestamp.is_none());
    assert!(updates.entries.is_empty());
}

#[test]
fn undecodable_request_is_rejected() {
    let (server, _) = setup();
    let (status, body) = server.handle_command(&[0x1f, 0x00, 0x13]);
    assert_eq!(status, 400);
    assert!(body.is_empty());

    // The lock was released: the server keeps answering.
    let (status, _) = server.handle_command(
        &ClientToServerMessage::authenticate("t").encode().unwrap(),
    );
    assert_eq!(status, 200);
}

#[test]
fn concurrent_clients_see_a_consistent_log() {
    let (server, client) = setup();
    let bar = bookmark_bar(&client);

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let server = Arc::clone(&server);
            let bar = bar.clone();
            std::thread::spawn(move || {
                let client = TestClient::new(server, &format!("client-{n}"));
                for i in 0..5 {
                    let response = client.commit(vec![bookmark(&format!("-{i}"), &bar, "x")]);
                    assert!(response.entry_responses[0].is_success());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let updates = client.get_updates(0, &[DataType::Bookmark]);
    let stamps: Vec<u64> = updates.entries.iter().map(|e| e.sync_timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(updates.entries.len(), 4 + 20);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Paging through a log of mixed types visits each wanted change exactly
    // once, and every page moves the timestamp forward.
    #[test]
    fn paging_always_makes_progress(
        types in prop::collection::vec(prop::sample::select(vec![DataType::Bookmark, DataType::Theme]), 1..40),
        batch_size in 1usize..8,
    ) {
        let server = Arc::new(SyncServer::new(
            ServerConfig::default()
                .with_batch_size(NonZeroUsize::new(batch_size).unwrap())
                .with_store_birthday("b"),
        ));
        let client = TestClient::new(Arc::clone(&server), "guid");
        let entries: Vec<SyncEntity> = types
            .iter()
            .enumerate()
            .map(|(n, data_type)| {
                SyncEntity::new(format!("-{n}"), ROOT_ID)
                    .with_specifics(EntitySpecifics::default_for(*data_type))
            })
            .collect();
        let response = client.commit(entries);
        prop_assert!(response.entry_responses.iter().all(|r| r.is_success()));

        let mut seen: HashMap<String, u64> = HashMap::new();
        let mut timestamp = 0;
        loop {
            let updates = client.get_updates(timestamp, &[DataType::Theme]);
            let Some(next) = updates.new_timestamp else { break };
            prop_assert!(next > timestamp);
            for entity in updates.entries {
                prop_assert!(seen.insert(entity.id_string, entity.version).is_none());
            }
            timestamp = next;
        }

        let themes = types.iter().filter(|t| **t == DataType::Theme).count();
        // Themes plus the top level and themes containers.
        prop_assert_eq!(seen.len(), themes + 2);
        prop_assert_eq!(timestamp, server.version());
    }
}
