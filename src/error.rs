//! Error types shared across the engine.
//!
//! Only programmer misuse (duplicate sources, unknown articles, operating on
//! a closed reader) surfaces as [`ReaderError`].  Fetch and delivery failures
//! are recoverable at the cycle level and are recorded in an
//! [`UpdateReport`](crate::reader::UpdateReport) instead of being returned.

use thiserror::Error;

/// Structured errors raised by registry, store and reader operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReaderError {
    /// A source with the same name or feed address is already registered.
    #[error("duplicate source `{name}` ({url}): {field} already registered")]
    DuplicateSource {
        name: String,
        url: String,
        field: DuplicateField,
    },

    /// No article with this identity exists in the store.
    #[error("unknown article `{0}`")]
    UnknownArticle(String),

    /// The reader has been shut down and accepts no further operations.
    #[error("reader is closed")]
    Closed,
}

/// Which part of a source collided with an existing registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Name,
    Url,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateField::Name => write!(f, "name"),
            DuplicateField::Url => write!(f, "feed address"),
        }
    }
}

/// A single source failed to produce entries this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("could not parse feed: {0}")]
    Parse(String),
}

/// Loading or saving the source list failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid feeds file: {0}")]
    Json(#[from] serde_json::Error),
}
