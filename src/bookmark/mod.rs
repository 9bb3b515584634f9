//! Input-state bookmarks
//!
//! A bookmark is either the inputs themselves embedded in a query string
//! (URL mode) or an id naming a record written to a [`BookmarkStore`]
//! (server mode). [`StateSerializer`] converts between the two forms and
//! live [`InputSnapshot`]s.

mod error;
mod hooks;
mod record;
mod serializer;
mod snapshot;
mod store;
mod value;

pub use error::BookmarkError;
pub use hooks::{BookmarkContext, BookmarkHooks, RestoreContext};
pub use record::{
    BookmarkRecord, InlineRecord, StateId, INPUTS_MARKER, STATE_ID_KEY, VALUES_MARKER,
};
pub use serializer::{BookmarkMode, RestoredState, StateSerializer, MAX_PORTABLE_QUERY_LEN};
pub use snapshot::{Exclusions, InputSnapshot, StateValues, BOOKMARK_BUTTON_ID};
pub use store::{BookmarkStore, FileStore, MemoryStore, StoredState, STORED_STATE_VERSION};
pub use value::InputValue;
