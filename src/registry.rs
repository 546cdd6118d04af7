//! The set of configured feed sources.
//!
//! A [`Source`] is identified by its name and its feed address; both must be
//! unique among active sources.  Sources are never edited in place: an edit is
//! a [`remove`](SourceRegistry::remove) followed by an
//! [`add`](SourceRegistry::add).
//!
//! Removed sources are *retired* rather than forgotten.  Articles fetched from
//! them stay in the store, so [`find`](SourceRegistry::find) must still be
//! able to resolve the owning source.  Retired sources are skipped by
//! [`all`](SourceRegistry::all) and therefore never fetched again.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{DuplicateField, ReaderError};

/// A configured feed to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique display name, also the identity articles point back to.
    pub name: String,
    /// Feed address.
    pub url: String,
    /// Optional grouping labels.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Builder-style helper that returns a copy carrying `tag`.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Ordered, de-duplicated collection of [`Source`]s.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    /// Active source names in insertion order; this is the fetch order.
    order: Vec<String>,
    active: HashMap<String, Source>,
    retired: HashMap<String, Source>,
}

impl SourceRegistry {
    /// Build a registry from an initial list, rejecting any collision.
    pub fn create(sources: impl IntoIterator<Item = Source>) -> Result<Self, ReaderError> {
        let mut registry = Self::default();
        for source in sources {
            registry.add(source)?;
        }
        Ok(registry)
    }

    /// Insert a source.  Fails without changing anything if its name or
    /// address is already taken by an active source.
    pub fn add(&mut self, source: Source) -> Result<(), ReaderError> {
        let collision = if self.active.contains_key(&source.name) {
            Some(DuplicateField::Name)
        } else if self.active.values().any(|s| s.url == source.url) {
            Some(DuplicateField::Url)
        } else {
            None
        };

        if let Some(field) = collision {
            return Err(ReaderError::DuplicateSource {
                name: source.name,
                url: source.url,
                field,
            });
        }

        self.retired.remove(&source.name);
        self.order.push(source.name.clone());
        self.active.insert(source.name.clone(), source);
        Ok(())
    }

    /// Retire the source called `name`.  Returns `false` if no active source
    /// had that name.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.active.remove(name) {
            Some(source) => {
                self.order.retain(|n| n != name);
                self.retired.insert(source.name.clone(), source);
                true
            }
            None => false,
        }
    }

    /// Resolve a source identity, including retired sources.
    pub fn find(&self, name: &str) -> Option<&Source> {
        self.active.get(name).or_else(|| self.retired.get(name))
    }

    /// Active sources in registry order.  Each call starts a fresh traversal.
    pub fn all(&self) -> impl Iterator<Item = &Source> + '_ {
        self.order.iter().filter_map(|name| self.active.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
