pub mod bookmark;
pub mod config;
pub mod replay;
pub mod util;
pub mod web;

pub use bookmark::{
    BookmarkError, BookmarkHooks, BookmarkMode, BookmarkRecord, BookmarkStore, Exclusions,
    FileStore, InputSnapshot, InputValue, MemoryStore, StateId, StateSerializer,
};
pub use config::Config;
pub use replay::{InputRegistry, MemoryRegistry, ReplayOutcome, ReplayTrigger, TriggerPolicy};
pub use web::{run_server, ServerConfig, WebAppState};
