//! Input and store fixtures

use std::sync::Arc;

use snapmark::{
    BookmarkMode, FileStore, InputSnapshot, MemoryRegistry, ReplayTrigger, StateSerializer,
    TriggerPolicy,
};
use tempfile::TempDir;

/// The four pendulum inputs at their declared defaults.
pub fn pendulum_snapshot() -> InputSnapshot {
    InputSnapshot::new()
        .with("omega", 1)
        .with("delta", 1)
        .with("damping", 1)
        .with("length", 100)
}

/// Registry declaring the pendulum inputs.
pub fn pendulum_registry() -> MemoryRegistry {
    pendulum_snapshot().into_iter().collect()
}

/// A server-mode serializer writing into a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn file_serializer() -> (StateSerializer, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::new(dir.path().join("bookmarks")));
    (StateSerializer::server(store), dir)
}

/// A trigger over the pendulum registry.
pub fn pendulum_trigger(
    mode: BookmarkMode,
    policy: TriggerPolicy,
) -> (ReplayTrigger<MemoryRegistry>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let serializer = StateSerializer::new(mode)
        .with_store(Arc::new(FileStore::new(dir.path().join("bookmarks"))));
    (
        ReplayTrigger::new(policy, serializer, pendulum_registry()),
        dir,
    )
}
