//! Remote-mediated pagination core.
//!
//! Serves infinite-scroll lists from a local cache that a [`RemoteMediator`]
//! keeps in sync with a [`NetworkFetcher`], and uncached lists straight from
//! the network through a [`NetworkPageSource`].

mod cache;
mod clock;
mod diagnostics;
mod error;
mod fetcher;
mod mediator;
mod memory;
mod page;
mod pager;
mod scope;
mod source;

pub use cache::{CacheTransaction, CachedRow, LocalCache};
pub use clock::{Clock, SystemClock};
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics};
pub use error::{BoxError, CacheError, FetchError, FetchErrorKind, MediatorError};
pub use fetcher::{LocalNetworkFetcher, NetworkFetcher};
pub use mediator::{
    DEFAULT_TTL, InitializeAction, LoadType, MediatorConfig, MediatorResult, PagingState,
    RemoteMediator,
};
pub use memory::MemoryCache;
pub use page::{Page, next_key, prev_key};
pub use pager::{LoadState, LoadStates, Pager};
pub use scope::{RemoteKey, Scope};
pub use source::{ItemFilter, LoadResult, NetworkPageSource, PageAnchor, refresh_anchor_key};
