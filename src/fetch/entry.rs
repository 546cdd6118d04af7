//! The raw entry type every fetch adapter produces.
//!
//! `RawEntry` is what a feed looks like before it is merged into the
//! [`ArticleStore`](crate::store::ArticleStore): no owning source, no read
//! state.  Adapters convert their native item format into `RawEntry` values
//! so the engine stays format-agnostic.

use chrono::{DateTime, Utc};

/// A single feed entry as returned by a [`FetchAdapter`](super::FetchAdapter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Canonical address of the entry.  This is the de-duplication key.
    ///
    /// For RSS this is the `<guid>` element, falling back to `<link>`.
    pub uri: String,

    /// Human-readable headline.
    pub title: String,

    /// Optional longer description or summary text.
    pub description: Option<String>,

    /// External link, which may differ from `uri` (e.g. a tracking redirect).
    pub link: Option<String>,

    /// Publication timestamp.  Adapters substitute the fetch time when the
    /// feed does not provide a usable date.
    pub published: DateTime<Utc>,
}

impl RawEntry {
    pub fn new(uri: impl Into<String>, title: impl Into<String>, published: DateTime<Utc>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            description: None,
            link: None,
            published,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
