//! Integration tests for capturing and restoring bookmarks
//!
//! Covers both URL and server mode end to end: snapshot, record, query
//! string, store, and back.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use snapmark::bookmark::{BookmarkRecord, StateValues};
use snapmark::{BookmarkError, InputSnapshot, InputValue, MemoryStore, StateId, StateSerializer};

use super::common::fixtures::{file_serializer, pendulum_snapshot};

fn round_trip(serializer: &StateSerializer, snapshot: &InputSnapshot) -> InputSnapshot {
    let record = serializer.capture(snapshot).expect("capture failed");
    let parsed = BookmarkRecord::from_query(&record.to_query())
        .expect("query failed to parse")
        .expect("query carried no bookmark");
    serializer.restore(&parsed).expect("restore failed")
}

/// The pendulum example encodes to the documented query and back
#[test]
fn test_pendulum_url_bookmark() {
    let serializer = StateSerializer::url();
    let snapshot = pendulum_snapshot();

    let record = serializer.capture(&snapshot).unwrap();
    assert_eq!(
        record.to_query(),
        "?_inputs_&damping=1&delta=1&length=100&omega=1"
    );
    assert_eq!(round_trip(&serializer, &snapshot), snapshot);
}

/// Server mode hands out a 16 hex char token that restores the snapshot
#[test]
fn test_pendulum_server_bookmark() {
    let (serializer, dir) = file_serializer();
    let snapshot = pendulum_snapshot();

    let record = serializer.capture(&snapshot).unwrap();
    let query = record.to_query();
    let token = query
        .strip_prefix("?_state_id_=")
        .expect("expected a reference query");
    assert_eq!(token.len(), 16);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    assert!(dir
        .path()
        .join("bookmarks")
        .join(token)
        .join("state.json")
        .is_file());
    assert_eq!(round_trip(&serializer, &snapshot), snapshot);
}

/// An unused token is reported as not found, which is recoverable
#[test]
fn test_unknown_token_is_not_found() {
    let (serializer, _dir) = file_serializer();
    serializer.capture(&pendulum_snapshot()).unwrap();

    let record = BookmarkRecord::Reference(StateId::generate());
    let err = serializer.restore(&record).unwrap_err();
    assert!(matches!(err, BookmarkError::NotFound(_)));
    assert!(err.is_recoverable());
}

/// Distinct captures never share a token
#[test]
fn test_server_ids_are_distinct() {
    let (serializer, _dir) = file_serializer();
    let mut seen = HashSet::new();

    for n in 0..64 {
        let snapshot = pendulum_snapshot().with("length", n);
        let record = serializer.capture(&snapshot).unwrap();
        let id = record.state_id().expect("server mode returns a reference");
        assert!(seen.insert(id.clone()), "duplicate id {}", id);
    }
}

/// Text, lists and maps survive URL mode
#[test]
fn test_structured_values_in_url_mode() {
    let serializer = StateSerializer::url();
    let snapshot = InputSnapshot::new()
        .with("title", "a & b = c?")
        .with("tags", vec!["x", "y z"])
        .with(
            "opts",
            InputValue::Map(BTreeMap::from([
                ("on".to_string(), InputValue::Bool(true)),
                ("ratio".to_string(), InputValue::Float(0.25)),
            ])),
        )
        .with("empty", InputValue::Null);

    assert_eq!(round_trip(&serializer, &snapshot), snapshot);
}

/// Inputs named like the query markers are ordinary data
#[test]
fn test_marker_named_inputs_round_trip() {
    let serializer = StateSerializer::url();
    let snapshot = InputSnapshot::new()
        .with("_state_id_", 1)
        .with("_inputs_", "x")
        .with("a", 2);

    assert_eq!(round_trip(&serializer, &snapshot), snapshot);
}

/// Binary content only fits server mode
#[test]
fn test_binary_values_need_server_mode() {
    let snapshot = InputSnapshot::new().with("upload", InputValue::Binary(vec![1, 2, 3]));

    let err = StateSerializer::url().capture(&snapshot).unwrap_err();
    assert!(matches!(err, BookmarkError::Unencodable { ref input, .. } if input == "upload"));

    let (serializer, _dir) = file_serializer();
    assert_eq!(round_trip(&serializer, &snapshot), snapshot);
}

/// Manual values reach `on_restore` in both modes
#[test]
fn test_manual_values_round_trip() {
    let (server, _dir) = file_serializer();

    for mut serializer in [StateSerializer::url(), server] {
        let restored: Arc<Mutex<Option<StateValues>>> = Arc::new(Mutex::new(None));
        let sink = restored.clone();

        serializer.on_bookmark(|ctx| {
            ctx.values.insert("clicks".to_string(), InputValue::Int(7));
        });
        serializer.on_restore(move |ctx| {
            *sink.lock().unwrap() = Some(ctx.values.clone());
        });

        let snapshot = pendulum_snapshot();
        assert_eq!(round_trip(&serializer, &snapshot), snapshot);

        let values = restored.lock().unwrap().clone().expect("on_restore not called");
        assert_eq!(values.get("clicks"), Some(&InputValue::Int(7)));
    }
}

/// A store that goes away fails captures and restores alike
#[test]
fn test_unavailable_store() {
    let store = Arc::new(MemoryStore::new());
    let serializer = StateSerializer::server(store.clone());
    let record = serializer.capture(&pendulum_snapshot()).unwrap();

    store.set_available(false);
    assert!(matches!(
        serializer.capture(&pendulum_snapshot()),
        Err(BookmarkError::StorageUnavailable(_))
    ));
    assert!(matches!(
        serializer.restore(&record),
        Err(BookmarkError::StorageUnavailable(_))
    ));
}

fn input_id() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => "[a-z_][a-z0-9_]{0,7}",
        // Names that collide with the query markers
        1 => prop::sample::select(vec!["_state_id_", "_inputs_", "_values_"])
            .prop_map(String::from),
    ]
}

fn input_value() -> impl Strategy<Value = InputValue> {
    prop_oneof![
        Just(InputValue::Null),
        any::<bool>().prop_map(InputValue::Bool),
        any::<i64>().prop_map(InputValue::Int),
        // Binary fractions print and parse back exactly
        (-1_000_000i32..1_000_000).prop_map(|n| InputValue::Float(f64::from(n) / 64.0)),
        "\\PC{0,12}".prop_map(InputValue::Text),
        prop::collection::vec(any::<i32>().prop_map(|i| InputValue::Int(i.into())), 0..4)
            .prop_map(InputValue::List),
    ]
}

fn snapshot() -> impl Strategy<Value = InputSnapshot> {
    prop::collection::btree_map(input_id(), input_value(), 0..8)
        .prop_map(|inputs| inputs.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_url_round_trip(snapshot in snapshot()) {
        let serializer = StateSerializer::url();
        prop_assert_eq!(round_trip(&serializer, &snapshot), snapshot);
    }

    #[test]
    fn prop_server_round_trip(snapshot in snapshot()) {
        let serializer = StateSerializer::server(Arc::new(MemoryStore::new()));
        prop_assert_eq!(round_trip(&serializer, &snapshot), snapshot);
    }

    #[test]
    fn prop_excluded_ids_never_recorded(
        snapshot in snapshot(),
        excluded in input_id(),
        value in input_value(),
    ) {
        let snapshot = snapshot.with(excluded.clone(), value);

        let mut url = StateSerializer::url();
        url.exclude([excluded.clone()]);
        let record = url.capture(&snapshot).unwrap();
        match &record {
            BookmarkRecord::Inline(inline) => {
                prop_assert!(inline.input_ids().all(|id| id != excluded));
            }
            BookmarkRecord::Reference(_) => prop_assert!(false, "url mode returned a reference"),
        }

        let mut server = StateSerializer::server(Arc::new(MemoryStore::new()));
        server.exclude([excluded.clone()]);
        let record = server.capture(&snapshot).unwrap();
        let restored = server.restore_state(&record).unwrap();
        prop_assert!(!restored.inputs.contains(&excluded));
    }
}
