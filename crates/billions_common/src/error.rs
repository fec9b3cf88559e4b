//! Error types for Billions Club.

use thiserror::Error;

/// Failures reported by a user-record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True when the store rejected the write because of a uniqueness rule
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Failures from an in-process [`crate::session::Session`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No user signed in")]
    NotSignedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A stored text column did not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
