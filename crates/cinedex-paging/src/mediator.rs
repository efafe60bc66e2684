//! `RemoteMediator` - reconciles the network with the local cache for one scope.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::cache::LocalCache;
use crate::clock::{Clock, SystemClock};
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::error::MediatorError;
use crate::fetcher::NetworkFetcher;
use crate::page::next_key;
use crate::scope::{RemoteKey, Scope};

/// Default maximum age of cached data (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Kind of load requested by the paging layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadType {
    /// Reload from the first page, replacing the cached rows.
    Refresh,
    /// Load before the first cached page. Never performed.
    Prepend,
    /// Load the page after the last cached one.
    Append,
}

/// Snapshot of the consumer's position when a load is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingState {
    /// Index of the most recently accessed row, if any.
    pub anchor_position: Option<usize>,
}

/// Startup decision made from the stored remote key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeAction {
    /// No key, or the cached data is older than the TTL.
    LaunchInitialRefresh,
    /// Cached rows are fresh enough to serve without a network call.
    SkipInitialRefresh,
}

/// Outcome of one mediator load.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum MediatorResult {
    /// The load finished and the cache holds its rows.
    Success {
        /// No further pages exist in this direction.
        end_of_pagination_reached: bool,
    },
    /// The load failed and the cache was left as it was.
    Error(MediatorError),
}

impl MediatorResult {
    const fn end() -> Self {
        Self::Success {
            end_of_pagination_reached: true,
        }
    }

    /// Returns `true` for [`MediatorResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` for a success that reached the end of pagination.
    #[must_use]
    pub const fn is_end_of_pagination(&self) -> bool {
        matches!(
            self,
            Self::Success {
                end_of_pagination_reached: true
            }
        )
    }

    /// Returns the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&MediatorError> {
        match self {
            Self::Success { .. } => None,
            Self::Error(err) => Some(err),
        }
    }
}

/// Mediator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct MediatorConfig {
    /// Maximum age of cached data before startup forces a refresh.
    pub ttl: Duration,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

/// Cache-backed pagination for one scope.
///
/// Generic over the fetch strategy and the cache; one instance per scope.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct RemoteMediator<F, C> {
    scope: Scope,
    fetcher: F,
    cache: Arc<C>,
    config: MediatorConfig,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<F, C> RemoteMediator<F, C>
where
    F: NetworkFetcher,
    F::Item: Send,
    C: LocalCache,
    C::Row: From<F::Item>,
{
    /// Creates a mediator with the default TTL, wall clock and tracing diagnostics.
    pub fn new(scope: Scope, fetcher: F, cache: Arc<C>) -> Self {
        Self {
            scope,
            fetcher,
            cache,
            config: MediatorConfig::default(),
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Overrides the tuning.
    #[must_use]
    pub const fn with_config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Scope served by this mediator.
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetch strategy bound to this mediator.
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Cache written by this mediator.
    pub const fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Current tuning.
    pub const fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Decides whether startup must refresh from the network.
    ///
    /// An unreadable key is treated like a missing one.
    #[instrument(skip_all, fields(scope = %self.scope))]
    pub async fn initialize(&self) -> InitializeAction {
        let key = match self.cache.read_remote_key(&self.scope).await {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read remote key, refreshing");
                return InitializeAction::LaunchInitialRefresh;
            }
        };

        match key {
            None => {
                tracing::debug!("no remote key, launching initial refresh");
                InitializeAction::LaunchInitialRefresh
            }
            Some(key) if key.is_stale(self.clock.now(), self.config.ttl) => {
                tracing::debug!(last_updated = %key.last_updated, "cache is stale");
                InitializeAction::LaunchInitialRefresh
            }
            Some(key) => {
                tracing::debug!(last_updated = %key.last_updated, "cache is fresh");
                InitializeAction::SkipInitialRefresh
            }
        }
    }

    /// Performs one load.
    ///
    /// Fetch failures leave the cache untouched; decode failures are also
    /// forwarded to the diagnostics sink. On success the cache write runs in a
    /// single transaction: a refresh clears the scope's rows and key, then the
    /// new key and rows are written.
    #[instrument(skip_all, fields(scope = %self.scope, ?load_type))]
    pub async fn load(&self, load_type: LoadType, state: &PagingState) -> MediatorResult {
        tracing::trace!(anchor = ?state.anchor_position, "load requested");

        let target_page = match load_type {
            LoadType::Refresh => 1,
            LoadType::Prepend => return MediatorResult::end(),
            LoadType::Append => match self.cache.read_remote_key(&self.scope).await {
                Ok(Some(RemoteKey {
                    next_page: Some(page),
                    ..
                })) => page,
                Ok(_) => {
                    tracing::debug!("nothing to append");
                    return MediatorResult::end();
                }
                Err(err) => return MediatorResult::Error(err.into()),
            },
        };

        let page = match self.fetcher.fetch(target_page).await {
            Ok(page) => page,
            Err(err) => {
                if err.is_decode() {
                    self.diagnostics.report(&self.scope, &err);
                }
                tracing::warn!(page = target_page, error = %err, "fetch failed");
                return MediatorResult::Error(err.into());
            }
        };

        let next_page = if page.is_empty() {
            None
        } else {
            next_key(target_page, page.total_pages)
        };
        let key = RemoteKey::new(&self.scope, next_page, self.clock.now());
        let rows: Vec<C::Row> = page.items.into_iter().map(C::Row::from).collect();
        let fetched = rows.len();
        let scope = self.scope.clone();
        let refresh = load_type == LoadType::Refresh;

        let written = self
            .cache
            .transaction(move |tx| {
                if refresh {
                    tx.delete_rows(&scope)?;
                    tx.delete_remote_key(&scope)?;
                }
                tx.upsert_remote_key(&key)?;
                tx.insert_rows(&scope, rows)
            })
            .await;

        match written {
            Ok(_) => {
                tracing::debug!(page = target_page, fetched, ?next_page, "page cached");
                MediatorResult::Success {
                    end_of_pagination_reached: next_page.is_none(),
                }
            }
            Err(err) => {
                tracing::warn!(page = target_page, error = %err, "cache write failed");
                MediatorResult::Error(err.into())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeDelta, Utc};
    use tokio::sync::broadcast;

    use super::*;
    use crate::cache::{CacheTransaction, CachedRow};
    use crate::error::{CacheError, FetchError, FetchErrorKind};
    use crate::memory::MemoryCache;
    use crate::page::Page;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Movie(pub(crate) u64);

    impl CachedRow for Movie {
        fn item_id(&self) -> u64 {
            self.0
        }
    }

    #[derive(Debug)]
    pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct CountingSink(pub(crate) AtomicUsize);

    impl DiagnosticsSink for CountingSink {
        fn report(&self, _scope: &Scope, _error: &FetchError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Serves pages of `per_page` movies out of `total_pages`, or scripted errors.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedFetcher {
        pub(crate) per_page: u64,
        pub(crate) total_pages: u32,
        pub(crate) errors: Mutex<VecDeque<FetchError>>,
        pub(crate) requested: Mutex<Vec<u32>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn new(per_page: u64, total_pages: u32) -> Self {
            Self {
                per_page,
                total_pages,
                ..Self::default()
            }
        }

        pub(crate) fn fail_next(&self, err: FetchError) {
            self.errors.lock().unwrap().push_back(err);
        }

        pub(crate) fn calls(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl NetworkFetcher for ScriptedFetcher {
        type Item = Movie;

        async fn fetch(&self, page: u32) -> Result<Page<Movie>, FetchError> {
            self.requested.lock().unwrap().push(page);
            if let Some(err) = self.errors.lock().unwrap().pop_front() {
                return Err(err);
            }
            let items = if page > self.total_pages {
                Vec::new()
            } else {
                let start = u64::from(page - 1) * self.per_page;
                (start..start + self.per_page).map(Movie).collect()
            };
            Ok(Page::new(items, page, self.total_pages))
        }
    }

    /// Counts every call and optionally fails inserts inside transactions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingCache {
        pub(crate) inner: MemoryCache<Movie>,
        pub(crate) calls: AtomicUsize,
        pub(crate) fail_inserts: std::sync::atomic::AtomicBool,
    }

    impl RecordingCache {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FailingInserts<'a> {
        inner: &'a mut dyn CacheTransaction<Movie>,
    }

    impl CacheTransaction<Movie> for FailingInserts<'_> {
        fn read_remote_key(&mut self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
            self.inner.read_remote_key(scope)
        }
        fn delete_rows(&mut self, scope: &Scope) -> Result<usize, CacheError> {
            self.inner.delete_rows(scope)
        }
        fn delete_remote_key(&mut self, scope: &Scope) -> Result<(), CacheError> {
            self.inner.delete_remote_key(scope)
        }
        fn insert_rows(&mut self, _scope: &Scope, _rows: Vec<Movie>) -> Result<usize, CacheError> {
            Err(CacheError::storage("insert rows", "injected failure"))
        }
        fn upsert_remote_key(&mut self, key: &RemoteKey) -> Result<(), CacheError> {
            self.inner.upsert_remote_key(key)
        }
    }

    impl LocalCache for RecordingCache {
        type Row = Movie;

        async fn read_remote_key(&self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
            self.hit();
            self.inner.read_remote_key(scope).await
        }

        async fn load_rows(&self, scope: &Scope) -> Result<Vec<Movie>, CacheError> {
            self.hit();
            self.inner.load_rows(scope).await
        }

        async fn count_rows(&self, scope: &Scope) -> Result<usize, CacheError> {
            self.hit();
            self.inner.count_rows(scope).await
        }

        async fn transaction<T, B>(&self, block: B) -> Result<T, CacheError>
        where
            T: Send + 'static,
            B: FnOnce(&mut dyn CacheTransaction<Movie>) -> Result<T, CacheError> + Send + 'static,
        {
            self.hit();
            if self.fail_inserts.load(Ordering::SeqCst) {
                self.inner
                    .transaction(move |tx| block(&mut FailingInserts { inner: tx }))
                    .await
            } else {
                self.inner.transaction(block).await
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<String> {
            self.inner.subscribe()
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn scope() -> Scope {
        Scope::new("movies/top_rated").with("language", "en-US")
    }

    fn mediator(
        fetcher: ScriptedFetcher,
        cache: Arc<RecordingCache>,
        now: DateTime<Utc>,
    ) -> (RemoteMediator<ScriptedFetcher, RecordingCache>, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink::default());
        let m = RemoteMediator::new(scope(), fetcher, cache)
            .with_clock(Arc::new(FixedClock(now)))
            .with_diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticsSink>);
        (m, sink)
    }

    async fn seed_key(cache: &RecordingCache, next_page: Option<u32>, at: DateTime<Utc>) {
        let key = RemoteKey::new(&scope(), next_page, at);
        cache
            .inner
            .transaction(move |tx| tx.upsert_remote_key(&key))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_initialize_without_key_launches_refresh() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), cache, t0());

        // Act
        let action = m.initialize().await;

        // Assert
        assert_eq!(action, InitializeAction::LaunchInitialRefresh);
    }

    #[tokio::test]
    async fn test_initialize_staleness_gate() {
        // Arrange
        let fresh_cache = Arc::new(RecordingCache::default());
        seed_key(&fresh_cache, Some(2), t0() - TimeDelta::minutes(59)).await;
        let stale_cache = Arc::new(RecordingCache::default());
        seed_key(&stale_cache, Some(2), t0() - TimeDelta::minutes(61)).await;
        let (fresh, _) = mediator(ScriptedFetcher::new(20, 5), fresh_cache, t0());
        let (stale, _) = mediator(ScriptedFetcher::new(20, 5), stale_cache, t0());

        // Act & Assert
        assert_eq!(fresh.initialize().await, InitializeAction::SkipInitialRefresh);
        assert_eq!(stale.initialize().await, InitializeAction::LaunchInitialRefresh);
    }

    #[tokio::test]
    async fn test_initialize_honours_configured_ttl() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        seed_key(&cache, Some(2), t0() - TimeDelta::minutes(10)).await;
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), cache, t0());
        let m = m.with_config(MediatorConfig {
            ttl: Duration::from_secs(5 * 60),
        });

        // Act & Assert
        assert_eq!(m.initialize().await, InitializeAction::LaunchInitialRefresh);
    }

    #[tokio::test]
    async fn test_prepend_is_a_no_op() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, sink) = mediator(ScriptedFetcher::new(20, 5), Arc::clone(&cache), t0());

        // Act
        let result = m.load(LoadType::Prepend, &PagingState::default()).await;

        // Assert
        assert!(result.is_end_of_pagination());
        assert!(m.fetcher.calls().is_empty());
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_append_without_key_ends_without_fetching() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), cache, t0());

        // Act
        let result = m.load(LoadType::Append, &PagingState::default()).await;

        // Assert
        assert!(result.is_end_of_pagination());
        assert!(m.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_append_after_last_page_ends_without_fetching() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        seed_key(&cache, None, t0()).await;
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), cache, t0());

        // Act
        let result = m.load(LoadType::Append, &PagingState::default()).await;

        // Assert
        assert!(result.is_end_of_pagination());
        assert!(m.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_writes_rows_and_key() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), Arc::clone(&cache), t0());

        // Act
        let result = m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        assert!(result.is_success());
        assert!(!result.is_end_of_pagination());
        assert_eq!(m.fetcher.calls(), vec![1]);
        assert_eq!(cache.inner.count_rows(&scope()).await.unwrap(), 20);
        let key = cache.inner.read_remote_key(&scope()).await.unwrap().unwrap();
        assert_eq!(key.next_page, Some(2));
        assert_eq!(key.last_updated, t0());
    }

    #[tokio::test]
    async fn test_refresh_replaces_previous_epoch() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let s = scope();
        cache
            .inner
            .transaction(move |tx| tx.insert_rows(&s, vec![Movie(900), Movie(901)]))
            .await
            .unwrap();
        let (m, _) = mediator(ScriptedFetcher::new(3, 2), Arc::clone(&cache), t0());

        // Act
        m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        assert_eq!(
            cache.inner.load_rows(&scope()).await.unwrap(),
            vec![Movie(0), Movie(1), Movie(2)]
        );
    }

    #[tokio::test]
    async fn test_empty_page_reaches_end_and_clears_next_page() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 0), Arc::clone(&cache), t0());

        // Act
        let result = m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        assert!(result.is_end_of_pagination());
        let key = cache.inner.read_remote_key(&scope()).await.unwrap().unwrap();
        assert_eq!(key.next_page, None);
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported_once() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let fetcher = ScriptedFetcher::new(20, 5);
        fetcher.fail_next(FetchError::decode("movie/top_rated", "missing field"));
        let (m, sink) = mediator(fetcher, Arc::clone(&cache), t0());

        // Act
        let result = m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        let err = result.error().unwrap();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Decode));
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_and_protocol_failures_are_not_reported() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let fetcher = ScriptedFetcher::new(20, 5);
        fetcher.fail_next(FetchError::network("GET", "timed out"));
        fetcher.fail_next(FetchError::protocol(500, "Internal Server Error"));
        let (m, sink) = mediator(fetcher, Arc::clone(&cache), t0());

        // Act
        let network = m.load(LoadType::Refresh, &PagingState::default()).await;
        let protocol = m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        assert_eq!(
            network.error().unwrap().fetch_kind(),
            Some(FetchErrorKind::Network)
        );
        assert_eq!(
            protocol.error().unwrap().fetch_kind(),
            Some(FetchErrorKind::Protocol)
        );
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
        assert!(cache.inner.read_remote_key(&scope()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_transaction_keeps_previous_rows() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), Arc::clone(&cache), t0());
        m.load(LoadType::Refresh, &PagingState::default()).await;
        m.load(LoadType::Append, &PagingState::default()).await;
        cache.fail_inserts.store(true, Ordering::SeqCst);

        // Act
        let result = m.load(LoadType::Refresh, &PagingState::default()).await;

        // Assert
        assert!(matches!(
            result,
            MediatorResult::Error(MediatorError::Cache(_))
        ));
        assert_eq!(cache.inner.count_rows(&scope()).await.unwrap(), 40);
        let key = cache.inner.read_remote_key(&scope()).await.unwrap().unwrap();
        assert_eq!(key.next_page, Some(3));
    }

    #[tokio::test]
    async fn test_paginates_to_the_last_page() {
        // Arrange
        let cache = Arc::new(RecordingCache::default());
        let (m, _) = mediator(ScriptedFetcher::new(20, 5), Arc::clone(&cache), t0());

        // Act
        m.load(LoadType::Refresh, &PagingState::default()).await;
        let mut last = None;
        for _ in 2..=5 {
            last = Some(m.load(LoadType::Append, &PagingState::default()).await);
        }
        let after = m.load(LoadType::Append, &PagingState::default()).await;

        // Assert
        assert!(last.unwrap().is_end_of_pagination());
        assert!(after.is_end_of_pagination());
        assert_eq!(m.fetcher.calls(), vec![1, 2, 3, 4, 5]);
        assert_eq!(cache.inner.count_rows(&scope()).await.unwrap(), 100);
        let key = cache.inner.read_remote_key(&scope()).await.unwrap().unwrap();
        assert_eq!(key.next_page, None);
    }

    #[tokio::test]
    async fn test_cancelled_load_is_not_an_error() {
        // Arrange
        #[derive(Debug)]
        struct Hanging;

        impl NetworkFetcher for Hanging {
            type Item = Movie;

            async fn fetch(&self, _page: u32) -> Result<Page<Movie>, FetchError> {
                std::future::pending().await
            }
        }

        let cache = Arc::new(RecordingCache::default());
        let sink = Arc::new(CountingSink::default());
        let m = RemoteMediator::new(scope(), Hanging, Arc::clone(&cache))
            .with_diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticsSink>);

        // Act
        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            m.load(LoadType::Refresh, &PagingState::default()),
        )
        .await;

        // Assert
        assert!(outcome.is_err());
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }
}
