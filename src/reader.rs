//! The aggregation engine.
//!
//! [`Reader`] is a cloneable handle over the whole reader state: sources,
//! articles, read markers and subscribers.  Every operation mutates that
//! shared state in place, so a timer loop can call
//! [`update_all`](Reader::update_all) repeatedly without threading a value
//! back to anyone.
//!
//! ## Update cycle
//!
//! ```text
//!  registry order ─► fetch (concurrent, no lock held)
//!                      │
//!                      ▼
//!                  merge (write lock, one source at a time)
//!                      │
//!                      ▼
//!                  deliver combined delta (lock released)
//! ```
//!
//! The write lock is held for the entire merge phase, so concurrent readers
//! see either the pre-cycle or the post-cycle state.  Cycles are serialized
//! by a separate mutex, and [`shutdown`](Reader::shutdown) waits on the same
//! mutex so it never lands in the middle of a cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::dispatch::{DeliveryFailure, Subscriber, Subscribers};
use crate::error::{FetchError, ReaderError};
use crate::fetch::FetchAdapter;
use crate::registry::{Source, SourceRegistry};
use crate::store::{self, Article, ArticleStore};

/// Lifecycle of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Updating,
    /// Terminal.  Reached only through [`Reader::shutdown`].
    Closed,
}

/// One source could not be fetched this cycle and was skipped.
#[derive(Debug)]
pub struct FetchFailure {
    pub source: String,
    pub error: FetchError,
}

/// Outcome of one [`Reader::update_all`] cycle.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Newly inserted articles, grouped by source in registry order and
    /// oldest first within each source.
    pub new_items: Vec<Article>,
    pub fetch_failures: Vec<FetchFailure>,
    pub delivery_failures: Vec<DeliveryFailure>,
}

impl UpdateReport {
    /// `true` when every fetch and every delivery succeeded.
    pub fn is_clean(&self) -> bool {
        self.fetch_failures.is_empty() && self.delivery_failures.is_empty()
    }
}

#[derive(Debug)]
struct ReaderState {
    registry: SourceRegistry,
    store: ArticleStore,
    subscribers: Subscribers,
    closed: bool,
}

impl ReaderState {
    fn ensure_open(&self) -> Result<(), ReaderError> {
        if self.closed {
            Err(ReaderError::Closed)
        } else {
            Ok(())
        }
    }

    fn newest_first(&self, keep: impl Fn(&Article) -> bool) -> Vec<Article> {
        let mut articles: Vec<Article> =
            self.store.iter().filter(|a| keep(*a)).cloned().collect();
        store::sort_newest_first(&mut articles);
        articles
    }
}

struct Inner {
    state: RwLock<ReaderState>,
    cycle: Mutex<()>,
    /// Set while a cycle is in flight; cleared by [`UpdatingFlag`] even if
    /// the cycle's future is dropped part way.
    updating: AtomicBool,
    fetcher: Arc<dyn FetchAdapter>,
}

struct UpdatingFlag<'a>(&'a AtomicBool);

impl<'a> UpdatingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for UpdatingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Shared handle to a feed reader.
#[derive(Clone)]
pub struct Reader {
    inner: Arc<Inner>,
}

impl Reader {
    /// Build an idle reader over `sources`, with no articles and no
    /// subscribers.
    pub fn create(
        sources: impl IntoIterator<Item = Source>,
        fetcher: Arc<dyn FetchAdapter>,
    ) -> Result<Self, ReaderError> {
        let registry = SourceRegistry::create(sources)?;
        info!(sources = registry.len(), "reader created");
        Ok(Self {
            inner: Arc::new(Inner {
                state: RwLock::new(ReaderState {
                    registry,
                    store: ArticleStore::default(),
                    subscribers: Subscribers::default(),
                    closed: false,
                }),
                cycle: Mutex::new(()),
                updating: AtomicBool::new(false),
                fetcher,
            }),
        })
    }

    /// Append `subscriber` to the delivery list.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Result<(), ReaderError> {
        let mut state = self.inner.state.write().await;
        state.ensure_open()?;
        debug!(subscriber = subscriber.name(), "subscribed");
        state.subscribers.push(subscriber);
        Ok(())
    }

    /// Run one fetch/merge/notify cycle over every active source.
    ///
    /// Individual fetch and delivery failures are recorded in the returned
    /// report; the only hard error is a closed reader.
    pub async fn update_all(&self) -> Result<UpdateReport, ReaderError> {
        let _cycle = self.inner.cycle.lock().await;

        let state = self.inner.state.read().await;
        state.ensure_open()?;
        let _updating = UpdatingFlag::raise(&self.inner.updating);
        let sources: Vec<Source> = state.registry.all().cloned().collect();
        drop(state);

        let fetcher = &self.inner.fetcher;
        let results = join_all(sources.iter().map(|source| fetcher.fetch(source))).await;

        let mut report = UpdateReport::default();
        let subscribers = {
            let mut state = self.inner.state.write().await;
            for (source, result) in sources.into_iter().zip(results) {
                match result {
                    Ok(entries) => {
                        let fetched = entries.len();
                        let delta = state.store.merge(&source.name, entries);
                        debug!(source = %source.name, fetched, new = delta.len(), "merged");
                        report.new_items.extend(delta);
                    }
                    Err(error) => {
                        warn!(source = %source.name, error = %error, "fetch failed, skipping");
                        report.fetch_failures.push(FetchFailure {
                            source: source.name,
                            error,
                        });
                    }
                }
            }
            state.subscribers.clone()
        };

        report.delivery_failures = subscribers.deliver(&report.new_items);

        info!(
            new = report.new_items.len(),
            fetch_failures = report.fetch_failures.len(),
            delivery_failures = report.delivery_failures.len(),
            "update cycle complete"
        );
        Ok(report)
    }

    /// Resolve the source that owns the article at `uri`.
    ///
    /// Sources that have since been removed still resolve.
    pub async fn try_find_source(&self, uri: &str) -> Result<Option<Source>, ReaderError> {
        let state = self.inner.state.read().await;
        state.ensure_open()?;
        Ok(state
            .store
            .get(uri)
            .and_then(|article| state.registry.find(&article.source))
            .cloned())
    }

    /// Mark `article` as read at `when`, replacing any earlier marker.
    pub async fn read_item(
        &self,
        article: &Article,
        when: DateTime<Utc>,
    ) -> Result<(), ReaderError> {
        let mut state = self.inner.state.write().await;
        state.ensure_open()?;
        state.store.mark_read(&article.uri, when)
    }

    /// Register a new source.  It is fetched from the next cycle on.
    pub async fn add_source(&self, source: Source) -> Result<(), ReaderError> {
        let mut state = self.inner.state.write().await;
        state.ensure_open()?;
        state.registry.add(source)
    }

    /// Stop fetching the source called `name`.  Its articles are kept.
    pub async fn remove_source(&self, name: &str) -> Result<bool, ReaderError> {
        let mut state = self.inner.state.write().await;
        state.ensure_open()?;
        Ok(state.registry.remove(name))
    }

    /// Transition to [`Phase::Closed`] once any running cycle has finished.
    pub async fn shutdown(&self) {
        let _cycle = self.inner.cycle.lock().await;
        let mut state = self.inner.state.write().await;
        if !state.closed {
            state.closed = true;
            info!("reader closed");
        }
    }

    // -- snapshots -----------------------------------------------------------
    //
    // These stay available after shutdown so a caller can inspect the final
    // state.

    pub async fn phase(&self) -> Phase {
        if self.inner.state.read().await.closed {
            Phase::Closed
        } else if self.inner.updating.load(Ordering::SeqCst) {
            Phase::Updating
        } else {
            Phase::Idle
        }
    }

    /// Active sources in registry order.
    pub async fn sources(&self) -> Vec<Source> {
        self.inner.state.read().await.registry.all().cloned().collect()
    }

    /// Every known article, newest first.
    pub async fn articles(&self) -> Vec<Article> {
        self.inner.state.read().await.newest_first(|_| true)
    }

    /// Articles without a read marker, newest first.
    pub async fn unread(&self) -> Vec<Article> {
        let state = self.inner.state.read().await;
        state.newest_first(|a| !state.store.is_read(&a.uri))
    }

    /// Articles whose owning source carries `tag`, newest first.
    pub async fn articles_tagged(&self, tag: &str) -> Vec<Article> {
        let state = self.inner.state.read().await;
        state.newest_first(|a| {
            state
                .registry
                .find(&a.source)
                .is_some_and(|source| source.has_tag(tag))
        })
    }

    pub async fn is_read(&self, uri: &str) -> bool {
        self.inner.state.read().await.store.is_read(uri)
    }

    pub async fn read_at(&self, uri: &str) -> Option<DateTime<Utc>> {
        self.inner.state.read().await.store.read_at(uri)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
