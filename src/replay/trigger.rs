//! When to capture, and how restored state reaches the UI

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bookmark::{BookmarkError, BookmarkRecord, InputSnapshot, InputValue, StateSerializer};

use super::registry::InputRegistry;

/// When captures happen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerPolicy {
    /// Only on a user action such as a bookmark button.
    #[default]
    Explicit,
    /// After every update cycle in which a non-excluded input changed.
    Automatic,
}

/// How the host should apply a location update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Replace the current history entry (no reload, no new entry)
    Replace,
}

/// New query string for the addressable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationUpdate {
    pub query: String,
    pub mode: HistoryMode,
}

/// What happened while replaying an incoming bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    /// Whether a bookmark was found and restored
    pub restored: bool,
    /// Inputs seeded from the bookmark
    pub applied: Vec<String>,
    /// Bookmark entries that match no declared (or an excluded) input
    pub ignored: Vec<String>,
    /// Non-fatal problems; defaults were used instead
    pub warnings: Vec<String>,
}

type BookmarkedCallback = Box<dyn Fn(&BookmarkRecord) + Send + Sync>;
type RestoredCallback = Box<dyn Fn(&InputSnapshot) + Send + Sync>;

/// Decides when to capture and replays incoming bookmarks into the registry.
pub struct ReplayTrigger<R> {
    policy: TriggerPolicy,
    serializer: StateSerializer,
    registry: R,
    started: bool,
    dirty: bool,
    location: Option<String>,
    on_bookmarked: Vec<BookmarkedCallback>,
    on_restored: Vec<RestoredCallback>,
}

impl<R: InputRegistry> ReplayTrigger<R> {
    pub fn new(policy: TriggerPolicy, serializer: StateSerializer, registry: R) -> Self {
        Self {
            policy,
            serializer,
            registry,
            started: false,
            dirty: false,
            location: None,
            on_bookmarked: Vec::new(),
            on_restored: Vec::new(),
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    pub fn serializer(&self) -> &StateSerializer {
        &self.serializer
    }

    pub fn serializer_mut(&mut self) -> &mut StateSerializer {
        &mut self.serializer
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Query last written to the addressable location, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called with every record produced by a successful capture.
    pub fn on_bookmarked<F>(&mut self, f: F)
    where
        F: Fn(&BookmarkRecord) + Send + Sync + 'static,
    {
        self.on_bookmarked.push(Box::new(f));
    }

    /// Called with the applied inputs after a bookmark was replayed.
    pub fn on_restored<F>(&mut self, f: F)
    where
        F: Fn(&InputSnapshot) + Send + Sync + 'static,
    {
        self.on_restored.push(Box::new(f));
    }

    /// Replay an incoming bookmark before the first computation.
    ///
    /// Never fails: a bookmark that cannot be restored leaves every input at
    /// its declared default and is reported as a warning.
    pub fn start(&mut self, query: Option<&str>) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();

        if self.started {
            tracing::warn!("Replay already ran for this session, ignoring");
            outcome
                .warnings
                .push("replay already ran for this session".to_string());
            return outcome;
        }
        self.started = true;

        if let Some(query) = query {
            match self.resolve(query) {
                Ok(Some(snapshot)) => {
                    let applied = self.apply(snapshot, &mut outcome);
                    outcome.restored = true;
                    self.location = Some(normalize_query(query));
                    for callback in &self.on_restored {
                        callback(&applied);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to restore bookmark, using defaults");
                    outcome
                        .warnings
                        .push(format!("Could not restore bookmark: {}", e));
                }
            }
        }

        if self.policy == TriggerPolicy::Automatic {
            self.dirty = true;
        }

        outcome
    }

    fn resolve(&self, query: &str) -> Result<Option<InputSnapshot>, BookmarkError> {
        match BookmarkRecord::from_query(query)? {
            Some(record) => self.serializer.restore(&record).map(Some),
            None => Ok(None),
        }
    }

    fn apply(&mut self, snapshot: InputSnapshot, outcome: &mut ReplayOutcome) -> InputSnapshot {
        let mut applied = InputSnapshot::new();
        for (id, value) in snapshot {
            if self.serializer.is_excluded(&id) {
                tracing::debug!(input = %id, "Skipping excluded input in bookmark");
                outcome.ignored.push(id);
            } else if self.registry.seed(&id, value.clone()) {
                outcome.applied.push(id.clone());
                applied.insert(id, value);
            } else {
                tracing::debug!(input = %id, "Bookmark input is not declared, ignoring");
                outcome.ignored.push(id);
            }
        }
        applied
    }

    /// Set a live input value and record the change.
    ///
    /// Returns `false` when the input is not declared.
    pub fn set_input(&mut self, id: &str, value: impl Into<InputValue>) -> bool {
        if !self.registry.set(id, value.into()) {
            return false;
        }
        self.input_changed(id);
        true
    }

    /// Note that an input changed. Under the automatic policy the next
    /// [`flush`](Self::flush) captures; excluded inputs are ignored.
    pub fn input_changed(&mut self, id: &str) {
        if self.policy == TriggerPolicy::Automatic && !self.serializer.is_excluded(id) {
            self.dirty = true;
        }
    }

    /// End of an update cycle: capture once if anything relevant changed.
    pub fn flush(&mut self) -> Option<Result<LocationUpdate, BookmarkError>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        Some(self.capture().map(|record| LocationUpdate {
            query: record.to_query(),
            mode: HistoryMode::Replace,
        }))
    }

    /// Explicit user action. Errors are returned to the caller as a failed
    /// bookmark action.
    pub fn request_bookmark(&mut self) -> Result<BookmarkRecord, BookmarkError> {
        self.capture()
    }

    fn capture(&mut self) -> Result<BookmarkRecord, BookmarkError> {
        let snapshot = self.registry.snapshot();
        let record = self.serializer.capture(&snapshot).map_err(|e| {
            tracing::warn!(error = %e, "Bookmark capture failed");
            e
        })?;

        self.location = Some(record.to_query());
        for callback in &self.on_bookmarked {
            callback(&record);
        }
        Ok(record)
    }
}

fn normalize_query(query: &str) -> String {
    if query.starts_with('?') {
        query.to_string()
    } else {
        format!("?{}", query)
    }
}

impl<R: fmt::Debug> fmt::Debug for ReplayTrigger<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayTrigger")
            .field("policy", &self.policy)
            .field("serializer", &self.serializer)
            .field("registry", &self.registry)
            .field("started", &self.started)
            .field("dirty", &self.dirty)
            .field("location", &self.location)
            .finish()
    }
}
