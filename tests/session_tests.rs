//! Tests for session identity and conversation stores.

mod common;

use std::collections::HashSet;

use common::{controller_with, test_config, MockProvider};
use parlor::session::{ConversationStore, FileStore, SessionId, SessionRegistry, StoreBackend};
use parlor::types::{Turn, TurnRole};
use tempfile::TempDir;

#[test]
fn generated_ids_do_not_collide() {
    let ids: HashSet<SessionId> = (0..1000).map(|_| SessionId::generate()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn sessions_do_not_share_turns() {
    let registry = SessionRegistry::in_memory();
    let a = registry.get_or_create(&SessionId::from("a")).unwrap();
    let b = registry.get_or_create(&SessionId::from("b")).unwrap();

    a.store().append(Turn::user("for a")).unwrap();

    assert_eq!(a.store().len(), 1);
    assert!(b.store().is_empty());
    assert_eq!(registry.session_ids().len(), 2);
}

#[test]
fn file_backed_session_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let backend = StoreBackend::File {
        dir: dir.path().to_path_buf(),
    };
    let provider = MockProvider::new();
    provider.queue_response("stored");
    let (mut chat, _) = controller_with(test_config(), provider, backend.clone());

    chat.submit_prompt("persist me").unwrap();
    let id = chat.session_id().clone();
    drop(chat);

    let reopened = SessionRegistry::new(backend)
        .get_or_create(&id)
        .unwrap();
    let turns = reopened.store().turns().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "persist me");
    assert_eq!(turns[1].content, "stored");
}

#[test]
fn file_store_appends_in_order() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path(), SessionId::generate()).unwrap();
    for i in 0..5 {
        store.append(Turn::user(format!("turn {i}"))).unwrap();
    }
    let contents: Vec<String> = store
        .turns()
        .unwrap()
        .into_iter()
        .map(|t| t.content)
        .collect();
    assert_eq!(contents, vec!["turn 0", "turn 1", "turn 2", "turn 3", "turn 4"]);
}
