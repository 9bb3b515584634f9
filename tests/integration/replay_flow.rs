//! Integration tests for replaying bookmarks into a live registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use snapmark::{
    BookmarkError, BookmarkMode, FileStore, InputRegistry, InputValue, ReplayTrigger,
    StateSerializer, TriggerPolicy,
};

use super::common::fixtures::{pendulum_registry, pendulum_trigger};

/// A bookmark taken in one session replays into a fresh one
#[test]
fn test_bookmark_replays_into_new_session() {
    for mode in [BookmarkMode::Url, BookmarkMode::Server] {
        let (mut first, dir) = pendulum_trigger(mode, TriggerPolicy::Explicit);
        first.start(None);
        first.set_input("omega", 2.5);
        first.set_input("length", 250);
        let query = first.request_bookmark().unwrap().to_query();

        // Second session reads the same store directory
        let serializer = StateSerializer::new(mode)
            .with_store(Arc::new(FileStore::new(dir.path().join("bookmarks"))));
        let mut second =
            ReplayTrigger::new(TriggerPolicy::Explicit, serializer, pendulum_registry());

        let restored = Arc::new(AtomicUsize::new(0));
        let counter = restored.clone();
        second.on_restored(move |inputs| {
            counter.store(inputs.len(), Ordering::SeqCst);
        });

        let outcome = second.start(Some(&query));
        assert!(outcome.restored, "{:?}: {:?}", mode, outcome.warnings);
        assert!(outcome.warnings.is_empty());
        assert_eq!(restored.load(Ordering::SeqCst), 4);
        assert_eq!(second.registry().value("omega"), Some(InputValue::Float(2.5)));
        assert_eq!(second.registry().value("length"), Some(InputValue::Int(250)));
        assert_eq!(second.location(), Some(query.as_str()));
    }
}

/// A token with no stored state leaves defaults and a warning
#[test]
fn test_unknown_token_falls_back_to_defaults() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Server, TriggerPolicy::Explicit);

    let outcome = trigger.start(Some("?_state_id_=00000000deadbeef"));
    assert!(!outcome.restored);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(trigger.registry().value("length"), Some(InputValue::Int(100)));
    assert_eq!(trigger.location(), None);
}

/// Inputs the host no longer declares are skipped
#[test]
fn test_undeclared_inputs_are_ignored() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Url, TriggerPolicy::Explicit);

    let outcome = trigger.start(Some("?_inputs_&gravity=9.8&length=50"));
    assert!(outcome.restored);
    assert_eq!(outcome.applied, vec!["length".to_string()]);
    assert_eq!(outcome.ignored, vec!["gravity".to_string()]);
    assert!(!trigger.registry().is_declared("gravity"));
}

/// Several changes in one cycle produce one capture
#[test]
fn test_automatic_policy_debounces_changes() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Url, TriggerPolicy::Automatic);
    trigger.start(None);
    let _ = trigger.flush();

    let captures = Arc::new(AtomicUsize::new(0));
    let counter = captures.clone();
    trigger.on_bookmarked(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    trigger.set_input("omega", 3);
    trigger.set_input("delta", 4);
    trigger.set_input("damping", 0.5);

    let update = trigger.flush().expect("expected a capture").unwrap();
    assert_eq!(
        update.query,
        "?_inputs_&damping=0.5&delta=4&length=100&omega=3"
    );
    assert!(trigger.flush().is_none());
    assert_eq!(captures.load(Ordering::SeqCst), 1);
}

/// Changes only to excluded inputs never capture
#[test]
fn test_automatic_policy_ignores_excluded_changes() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Url, TriggerPolicy::Automatic);
    trigger.serializer_mut().exclude(["length"]);
    trigger.start(None);
    let _ = trigger.flush();

    trigger.set_input("length", 300);
    assert!(!trigger.is_dirty());
    assert!(trigger.flush().is_none());
}

/// Automatic server-mode flushes write a fresh record each time
#[test]
fn test_automatic_server_mode_writes_new_records() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Server, TriggerPolicy::Automatic);
    trigger.start(None);
    let first = trigger.flush().unwrap().unwrap();

    trigger.set_input("omega", 9);
    let second = trigger.flush().unwrap().unwrap();

    assert!(first.query.starts_with("?_state_id_="));
    assert_ne!(first.query, second.query);
}

/// Disabled bookmarking refuses the explicit action
#[test]
fn test_disabled_mode_refuses_bookmark() {
    let (mut trigger, _dir) = pendulum_trigger(BookmarkMode::Disabled, TriggerPolicy::Explicit);
    trigger.start(None);

    assert!(matches!(
        trigger.request_bookmark(),
        Err(BookmarkError::Disabled)
    ));
    assert_eq!(trigger.location(), None);
}
