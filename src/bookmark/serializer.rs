//! Capture and restore of input snapshots

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::BookmarkError;
use super::hooks::{BookmarkContext, BookmarkHooks, RestoreContext};
use super::record::{BookmarkRecord, InlineRecord};
use super::snapshot::{Exclusions, InputSnapshot, StateValues};
use super::store::{BookmarkStore, StoredState};

/// Queries longer than this may be truncated by some browsers.
pub const MAX_PORTABLE_QUERY_LEN: usize = 2000;

/// Where captured state is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BookmarkMode {
    /// Inputs are embedded in the query string.
    #[default]
    Url,
    /// Inputs are written to a store and the query only carries the id.
    Server,
    #[serde(alias = "disable")]
    #[value(alias = "disable")]
    Disabled,
}

/// Result of a restore: the inputs plus any manual values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestoredState {
    pub inputs: InputSnapshot,
    pub values: StateValues,
}

/// Converts input snapshots to bookmark records and back.
#[derive(Debug)]
pub struct StateSerializer {
    mode: BookmarkMode,
    store: Option<Arc<dyn BookmarkStore>>,
    exclusions: Exclusions,
    hooks: BookmarkHooks,
}

impl StateSerializer {
    pub fn new(mode: BookmarkMode) -> Self {
        Self {
            mode,
            store: None,
            exclusions: Exclusions::default(),
            hooks: BookmarkHooks::default(),
        }
    }

    /// URL-mode serializer without a store
    pub fn url() -> Self {
        Self::new(BookmarkMode::Url)
    }

    /// Server-mode serializer writing to `store`
    pub fn server(store: Arc<dyn BookmarkStore>) -> Self {
        Self::new(BookmarkMode::Server).with_store(store)
    }

    /// Attach a store. In URL mode it is only used to resolve reference records.
    pub fn with_store(mut self, store: Arc<dyn BookmarkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn mode(&self) -> BookmarkMode {
        self.mode
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    /// Replace the exclusion set. The bookmark button stays excluded.
    pub fn set_exclusions<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = Exclusions::new(ids);
    }

    pub fn exclude<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(ids);
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.exclusions.contains(id)
    }

    pub fn on_bookmark<F>(&mut self, f: F)
    where
        F: Fn(&mut BookmarkContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.on_bookmark(f);
    }

    pub fn on_restore<F>(&mut self, f: F)
    where
        F: Fn(&RestoreContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.on_restore(f);
    }

    /// Capture a snapshot into a record.
    ///
    /// Excluded identifiers are dropped first; `on_bookmark` hooks then
    /// contribute manual values. Nothing falls back to another mode: a value
    /// the current mode cannot represent fails the capture.
    pub fn capture(&self, snapshot: &InputSnapshot) -> Result<BookmarkRecord, BookmarkError> {
        if self.mode == BookmarkMode::Disabled {
            return Err(BookmarkError::Disabled);
        }

        let inputs = snapshot.without(&self.exclusions);
        let values = self.hooks.run_bookmark(&inputs);

        match self.mode {
            BookmarkMode::Url => {
                let record = BookmarkRecord::Inline(InlineRecord::encode(&inputs, &values)?);
                let len = record.to_query().len();
                if len > MAX_PORTABLE_QUERY_LEN {
                    tracing::warn!(
                        len,
                        max = MAX_PORTABLE_QUERY_LEN,
                        "Bookmark query is long and may not work in all browsers"
                    );
                }
                Ok(record)
            }
            BookmarkMode::Server => {
                for (id, value) in inputs.iter().chain(values.iter()) {
                    value
                        .check_storable()
                        .map_err(|reason| BookmarkError::Unencodable {
                            input: id.clone(),
                            reason,
                        })?;
                }
                let store = self.store()?;
                let id = store.create(&StoredState::new(inputs, values))?;
                Ok(BookmarkRecord::Reference(id))
            }
            BookmarkMode::Disabled => Err(BookmarkError::Disabled),
        }
    }

    /// Restore the inputs of a record, running `on_restore` hooks.
    pub fn restore(&self, record: &BookmarkRecord) -> Result<InputSnapshot, BookmarkError> {
        let restored = self.restore_state(record)?;
        self.hooks.run_restore(&restored.inputs, &restored.values);
        Ok(restored.inputs)
    }

    /// Restore inputs and manual values without running hooks.
    pub fn restore_state(&self, record: &BookmarkRecord) -> Result<RestoredState, BookmarkError> {
        match record {
            BookmarkRecord::Inline(inline) => {
                let (inputs, values) = inline.decode()?;
                Ok(RestoredState { inputs, values })
            }
            BookmarkRecord::Reference(id) => {
                let stored = self.store()?.load(id)?;
                Ok(RestoredState {
                    inputs: stored.inputs,
                    values: stored.values,
                })
            }
        }
    }

    fn store(&self) -> Result<&Arc<dyn BookmarkStore>, BookmarkError> {
        self.store
            .as_ref()
            .ok_or_else(|| BookmarkError::unavailable("no bookmark store configured"))
    }
}
