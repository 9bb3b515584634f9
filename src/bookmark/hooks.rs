//! Manual-state hooks
//!
//! Hosts use these to save state that does not live in an ordinary input,
//! e.g. a value accumulated from several clicks.

use std::fmt;

use super::snapshot::{InputSnapshot, StateValues};

/// Passed to `on_bookmark` callbacks during capture.
pub struct BookmarkContext<'a> {
    /// The inputs being captured, after exclusions
    pub inputs: &'a InputSnapshot,
    /// Extra values to persist alongside the inputs
    pub values: &'a mut StateValues,
}

/// Passed to `on_restore` callbacks during restore.
pub struct RestoreContext<'a> {
    pub inputs: &'a InputSnapshot,
    pub values: &'a StateValues,
}

type BookmarkCallback = Box<dyn Fn(&mut BookmarkContext<'_>) + Send + Sync>;
type RestoreCallback = Box<dyn Fn(&RestoreContext<'_>) + Send + Sync>;

/// Registered capture and restore callbacks, run in registration order.
#[derive(Default)]
pub struct BookmarkHooks {
    on_bookmark: Vec<BookmarkCallback>,
    on_restore: Vec<RestoreCallback>,
}

impl BookmarkHooks {
    pub fn on_bookmark<F>(&mut self, f: F)
    where
        F: Fn(&mut BookmarkContext<'_>) + Send + Sync + 'static,
    {
        self.on_bookmark.push(Box::new(f));
    }

    pub fn on_restore<F>(&mut self, f: F)
    where
        F: Fn(&RestoreContext<'_>) + Send + Sync + 'static,
    {
        self.on_restore.push(Box::new(f));
    }

    /// Collect the values every `on_bookmark` callback contributes.
    pub(crate) fn run_bookmark(&self, inputs: &InputSnapshot) -> StateValues {
        let mut values = StateValues::new();
        let mut ctx = BookmarkContext {
            inputs,
            values: &mut values,
        };
        for callback in &self.on_bookmark {
            callback(&mut ctx);
        }
        values
    }

    pub(crate) fn run_restore(&self, inputs: &InputSnapshot, values: &StateValues) {
        let ctx = RestoreContext { inputs, values };
        for callback in &self.on_restore {
            callback(&ctx);
        }
    }
}

impl fmt::Debug for BookmarkHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookmarkHooks")
            .field("on_bookmark", &self.on_bookmark.len())
            .field("on_restore", &self.on_restore.len())
            .finish()
    }
}
