//! Replaying bookmarks into the host UI
//!
//! [`ReplayTrigger`] seeds restored values into an [`InputRegistry`] before
//! the host's first reactive pass and decides when new captures happen.

mod registry;
mod trigger;

pub use registry::{InputRegistry, MemoryRegistry};
pub use trigger::{HistoryMode, LocationUpdate, ReplayOutcome, ReplayTrigger, TriggerPolicy};
