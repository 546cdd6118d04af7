//! Fetch adapter abstraction.
//!
//! The engine never parses feeds itself.  It asks a [`FetchAdapter`] for the
//! current entries of each [`Source`] and treats the result as opaque.  The
//! only shipped implementation is [`RssFetcher`]; tests plug in scripted
//! adapters.
//!
//! ## Adding a new adapter
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a struct and implement [`FetchAdapter`] for it, converting the
//!    native items into [`RawEntry`] values.
//! 3. Add `mod atom;` below and re-export the struct.

mod entry;
mod rss;

pub use entry::RawEntry;
pub use self::rss::RssFetcher;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::registry::Source;

/// Turns a source into its current raw entries.
///
/// The reader calls [`fetch`](FetchAdapter::fetch) for every active source
/// concurrently within one update cycle, so implementations must be
/// [`Send`] + [`Sync`].
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// Fetch the latest batch of entries for `source`.
    async fn fetch(&self, source: &Source) -> Result<Vec<RawEntry>, FetchError>;
}
