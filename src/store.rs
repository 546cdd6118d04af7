//! Known articles and their read markers.
//!
//! The store is keyed by an article's canonical address (its `uri`).  Merging
//! a batch of raw entries inserts the unknown ones and refreshes the mutable
//! fields of the known ones; only insertions are reported back as the delta.
//! That asymmetry is what keeps an unchanged re-fetch from notifying anyone.
//!
//! Articles are never removed, so any lookup that succeeded once keeps
//! succeeding.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ReaderError;
use crate::fetch::RawEntry;

/// A de-duplicated feed entry owned by a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Canonical address; unique within the store.
    pub uri: String,
    pub title: String,
    pub description: Option<String>,
    /// External link, which may differ from `uri`.
    pub link: Option<String>,
    pub published: DateTime<Utc>,
    /// Name of the owning [`Source`](crate::registry::Source).
    pub source: String,
}

impl Article {
    fn from_entry(source: &str, entry: RawEntry) -> Self {
        Self {
            uri: entry.uri,
            title: entry.title,
            description: entry.description,
            link: entry.link,
            published: entry.published,
            source: source.to_string(),
        }
    }
}

/// Sort oldest to newest, ties broken by identity.
pub(crate) fn sort_chronological(articles: &mut [Article]) {
    articles.sort_by(|a, b| a.published.cmp(&b.published).then_with(|| a.uri.cmp(&b.uri)));
}

/// Sort newest to oldest, ties broken by identity.
pub(crate) fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| a.uri.cmp(&b.uri)));
}

#[derive(Debug, Clone, Default)]
pub struct ArticleStore {
    articles: HashMap<String, Article>,
    read: HashMap<String, DateTime<Utc>>,
}

impl ArticleStore {
    /// Merge a source's entries and return the newly inserted articles,
    /// oldest first.
    ///
    /// Known entries only have their title and description refreshed.  An
    /// entry whose identity already belongs to a different source is left
    /// untouched, since an article's owner never changes.
    pub fn merge(&mut self, source: &str, entries: Vec<RawEntry>) -> Vec<Article> {
        let mut inserted = Vec::new();

        for entry in entries {
            match self.articles.get_mut(&entry.uri) {
                Some(existing) if existing.source == source => {
                    existing.title = entry.title;
                    existing.description = entry.description;
                }
                Some(existing) => {
                    debug!(
                        uri = %entry.uri,
                        owner = %existing.source,
                        source,
                        "ignoring entry already owned by another source"
                    );
                }
                None => {
                    inserted.push(entry.uri.clone());
                    self.articles
                        .insert(entry.uri.clone(), Article::from_entry(source, entry));
                }
            }
        }

        // Built after the loop so a later duplicate in the same batch is
        // reflected in the delta.
        let mut delta: Vec<Article> = inserted
            .iter()
            .filter_map(|uri| self.articles.get(uri).cloned())
            .collect();
        sort_chronological(&mut delta);
        delta
    }

    /// Record that `uri` was read at `when`, overwriting any earlier marker.
    pub fn mark_read(&mut self, uri: &str, when: DateTime<Utc>) -> Result<(), ReaderError> {
        if !self.articles.contains_key(uri) {
            return Err(ReaderError::UnknownArticle(uri.to_string()));
        }
        self.read.insert(uri.to_string(), when);
        Ok(())
    }

    pub fn is_read(&self, uri: &str) -> bool {
        self.read.contains_key(uri)
    }

    pub fn read_at(&self, uri: &str) -> Option<DateTime<Utc>> {
        self.read.get(uri).copied()
    }

    pub fn get(&self, uri: &str) -> Option<&Article> {
        self.articles.get(uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> + '_ {
        self.articles.values()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn read_count(&self) -> usize {
        self.read.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
