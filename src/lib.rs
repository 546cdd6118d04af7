//! feedwatch — a feed reader engine.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ sources ┌───────────┐  fetch()  ┌──────────┐
//! │ persist  │ ──────► │  reader   │ ◄───────► │  fetch/  │
//! │  (JSON)  │         │ (engine)  │           │ (adapter)│
//! └──────────┘         └───────────┘           └──────────┘
//!                         │     │ merge()
//!            on_new_items │     ▼
//!                         │  ┌──────────┐
//!                         │  │  store   │
//!                         ▼  └──────────┘
//!                    ┌──────────┐
//!                    │ dispatch │ ──► observers
//!                    └──────────┘
//! ```
//!
//! * **`registry`** — configured [`Source`]s, unique by name and address.
//! * **`store`** — known [`Article`]s keyed by canonical address, plus read
//!   markers.
//! * **`fetch/`** — the [`FetchAdapter`] trait and the RSS implementation.
//! * **`dispatch`** — the [`Subscriber`] trait and ordered delivery.
//! * **`reader`** — [`Reader`], which owns all of the above and runs update
//!   cycles.
//! * **`poll`** — the timer loop that drives a reader until shutdown.
//! * **`persist`** / **`config`** — the source file and runtime settings used
//!   by the binary.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod persist;
pub mod poll;
pub mod reader;
pub mod registry;
pub mod store;

pub use dispatch::{DeliveryFailure, FnSubscriber, Subscriber};
pub use error::{FetchError, PersistError, ReaderError};
pub use fetch::{FetchAdapter, RawEntry, RssFetcher};
pub use reader::{FetchFailure, Phase, Reader, UpdateReport};
pub use registry::{Source, SourceRegistry};
pub use store::{Article, ArticleStore};
