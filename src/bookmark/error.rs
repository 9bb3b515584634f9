//! Bookmark error types

use thiserror::Error;

use super::record::StateId;

#[derive(Error, Debug)]
pub enum BookmarkError {
    /// The query string or a stored record could not be decoded.
    #[error("Malformed bookmark: {0}")]
    Parse(String),
    /// No stored state exists for the given id.
    #[error("Bookmark not found: {0}")]
    NotFound(StateId),
    /// The backing store could not be reached or written.
    #[error("Bookmark storage unavailable: {0}")]
    StorageUnavailable(#[source] std::io::Error),
    /// An input holds a value the selected mode cannot represent.
    #[error("Input '{input}' cannot be bookmarked: {reason}")]
    Unencodable { input: String, reason: &'static str },
    #[error("Bookmarking is disabled")]
    Disabled,
}

impl BookmarkError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(std::io::Error::other(msg.into()))
    }

    /// Whether this error comes from the restore side and should fall back to defaults.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::NotFound(_) | Self::StorageUnavailable(_)
        )
    }
}
