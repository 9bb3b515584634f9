//! Out-of-band storage for server-mode bookmarks

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::BookmarkError;
use super::record::StateId;
use super::snapshot::{InputSnapshot, StateValues};

pub const STORED_STATE_VERSION: u32 = 1;

const STATE_FILE: &str = "state.json";

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// A snapshot as written by storage mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub inputs: InputSnapshot,
    #[serde(default)]
    pub values: StateValues,
}

impl StoredState {
    pub fn new(inputs: InputSnapshot, values: StateValues) -> Self {
        Self {
            version: STORED_STATE_VERSION,
            created_at: Utc::now(),
            inputs,
            values,
        }
    }
}

/// Persistence boundary for server-mode bookmarks.
///
/// Records are immutable once created. Implementations must never hand out
/// an id that already names a record.
pub trait BookmarkStore: Send + Sync + fmt::Debug {
    /// Persist a state under a freshly generated id.
    fn create(&self, state: &StoredState) -> Result<StateId, BookmarkError>;

    /// Load a previously created state.
    fn load(&self, id: &StateId) -> Result<StoredState, BookmarkError>;
}

/// File-backed store: one directory per bookmark, `<root>/<id>/state.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a bookmark's files
    pub fn bookmark_dir(&self, id: &StateId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Claim a fresh bookmark directory.
    ///
    /// `create_dir` fails on an existing directory, so two writers can never
    /// end up sharing an id.
    fn claim_dir(&self) -> Result<(StateId, PathBuf), BookmarkError> {
        fs::create_dir_all(&self.root).map_err(BookmarkError::StorageUnavailable)?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = StateId::generate();
            let dir = self.bookmark_dir(&id);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((id, dir)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(id = %id, "State id already taken, drawing another");
                }
                Err(e) => return Err(BookmarkError::StorageUnavailable(e)),
            }
        }

        Err(BookmarkError::unavailable(format!(
            "no unused state id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    fn write_state(dir: &Path, state: &StoredState) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state).map_err(io::Error::other)?;
        tmp.flush()?;
        tmp.persist(dir.join(STATE_FILE)).map_err(|e| e.error)?;
        Ok(())
    }
}

impl BookmarkStore for FileStore {
    fn create(&self, state: &StoredState) -> Result<StateId, BookmarkError> {
        let (id, dir) = self.claim_dir()?;

        if let Err(e) = Self::write_state(&dir, state) {
            // Leave no half-written bookmark behind.
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %cleanup,
                    "Failed to remove incomplete bookmark directory"
                );
            }
            return Err(BookmarkError::StorageUnavailable(e));
        }

        tracing::debug!(id = %id, dir = %dir.display(), "Stored bookmark state");
        Ok(id)
    }

    fn load(&self, id: &StateId) -> Result<StoredState, BookmarkError> {
        if !self.root.is_dir() {
            return Err(BookmarkError::StorageUnavailable(io::Error::new(
                io::ErrorKind::NotFound,
                format!("bookmark store {} does not exist", self.root.display()),
            )));
        }

        let path = self.bookmark_dir(id).join(STATE_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BookmarkError::NotFound(id.clone()))
            }
            Err(e) => return Err(BookmarkError::StorageUnavailable(e)),
        };

        let state: StoredState = serde_json::from_str(&contents).map_err(|e| {
            BookmarkError::parse(format!("corrupt bookmark {}: {}", path.display(), e))
        })?;

        if state.version > STORED_STATE_VERSION {
            return Err(BookmarkError::parse(format!(
                "unsupported bookmark version {} (max supported: {})",
                state.version, STORED_STATE_VERSION
            )));
        }

        Ok(state)
    }
}

/// In-memory store for embedding hosts and tests.
#[derive(Debug)]
pub struct MemoryStore {
    states: Mutex<HashMap<StateId, StoredState>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    fn check_available(&self) -> Result<(), BookmarkError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(BookmarkError::unavailable("memory store is offline"))
        }
    }
}

impl BookmarkStore for MemoryStore {
    fn create(&self, state: &StoredState) -> Result<StateId, BookmarkError> {
        self.check_available()?;
        let mut states = self.states.lock();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = StateId::generate();
            if let std::collections::hash_map::Entry::Vacant(slot) = states.entry(id.clone()) {
                slot.insert(state.clone());
                return Ok(id);
            }
        }
        Err(BookmarkError::unavailable("no unused state id"))
    }

    fn load(&self, id: &StateId) -> Result<StoredState, BookmarkError> {
        self.check_available()?;
        self.states
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| BookmarkError::NotFound(id.clone()))
    }
}
