//! Remote-mediated paging of a TMDB list into the `SQLite` cache.
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use cinedex_api::tmdb::{
    ListParams, MovieList, MovieListFetcher, NowPlayingFetcher, Relation, SearchMovieParams, SearchTvParams,
    TmdbApi, TmdbConfiguration, TmdbMovie, TmdbPage, TmdbTvShow, TvList,
};
use cinedex_db::{CachedMovie, Database, SqliteCache};
use cinedex_paging::{
    Clock, FetchError, InitializeAction, LoadType, LocalCache, Pager, PagingState, RemoteKey,
    RemoteMediator,
};
use futures::StreamExt;

const PER_PAGE: u64 = 20;
const TOTAL_PAGES: u32 = 5;

/// Serves `TOTAL_PAGES` pages of `PER_PAGE` movies and counts requests.
#[derive(Debug, Default)]
struct FakeTmdb {
    requests: AtomicUsize,
}

impl FakeTmdb {
    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn movie(id: u64, language: &str) -> TmdbMovie {
    TmdbMovie {
        id,
        title: format!("{language} {id}"),
        original_title: None,
        original_language: Some(String::from("en")),
        overview: Some(String::from("Overview")),
        release_date: Some(String::from("1999-01-01")),
        poster_path: Some(format!("/{id}.jpg")),
        backdrop_path: None,
        popularity: 1.0,
        vote_average: 8.0,
        vote_count: 100,
        genre_ids: Vec::new(),
        adult: false,
    }
}

fn unscripted<T>() -> Result<T, FetchError> {
    Err(FetchError::protocol(404, "not scripted"))
}

impl TmdbApi for FakeTmdb {
    async fn movie_list(
        &self,
        _list: &MovieList,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let first = u64::from(params.page - 1) * PER_PAGE;
        Ok(TmdbPage {
            page: params.page,
            results: (first..first + PER_PAGE)
                .map(|id| movie(id, &params.language))
                .collect(),
            total_pages: TOTAL_PAGES,
            total_results: u32::try_from(PER_PAGE).unwrap() * TOTAL_PAGES,
        })
    }

    async fn tv_list(
        &self,
        _list: &TvList,
        _params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        unscripted()
    }

    async fn search_movie(
        &self,
        _params: &SearchMovieParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        unscripted()
    }

    async fn search_tv(&self, _params: &SearchTvParams) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        unscripted()
    }

    async fn related_movies(
        &self,
        _movie_id: u64,
        _relation: Relation,
        _params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        unscripted()
    }

    async fn related_tv(
        &self,
        _series_id: u64,
        _relation: Relation,
        _params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        unscripted()
    }

    async fn configuration(&self) -> Result<TmdbConfiguration, FetchError> {
        unscripted()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    fn advance(&self, by: TimeDelta) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

type TopRatedMediator = RemoteMediator<MovieListFetcher<FakeTmdb>, SqliteCache<CachedMovie>>;

fn top_rated(db: Database, api: &Arc<FakeTmdb>, clock: Arc<ManualClock>) -> TopRatedMediator {
    let fetcher = MovieListFetcher::new(
        Arc::clone(api),
        MovieList::TopRated,
        ListParams::default().language("en-US"),
    );
    let scope = fetcher.scope();
    RemoteMediator::new(scope, fetcher, Arc::new(SqliteCache::movies(db))).with_clock(clock)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn test_top_rated_pages_through_to_the_end() {
    // Arrange
    let db = Database::open_in_memory().unwrap();
    let api = Arc::new(FakeTmdb::default());
    let clock = ManualClock::at(t0());
    let mediator = top_rated(db, &api, Arc::clone(&clock));
    let scope = mediator.scope().clone();
    let cache = Arc::clone(mediator.cache());
    let state = PagingState::default();

    // Act & Assert: startup with no state refreshes
    assert_eq!(mediator.initialize().await, InitializeAction::LaunchInitialRefresh);

    let result = mediator.load(LoadType::Refresh, &state).await;
    assert!(result.is_success());
    assert!(!result.is_end_of_pagination());
    assert_eq!(cache.count_rows(&scope).await.unwrap(), 20);
    assert_eq!(
        cache.read_remote_key(&scope).await.unwrap(),
        Some(RemoteKey::new(&scope, Some(2), t0()))
    );

    let result = mediator.load(LoadType::Append, &state).await;
    assert!(result.is_success());
    assert_eq!(cache.count_rows(&scope).await.unwrap(), 40);
    assert_eq!(
        cache.read_remote_key(&scope).await.unwrap().unwrap().next_page,
        Some(3)
    );

    for _ in 3..=TOTAL_PAGES {
        assert!(mediator.load(LoadType::Append, &state).await.is_success());
    }
    let key = cache.read_remote_key(&scope).await.unwrap().unwrap();
    assert_eq!(key.next_page, None);
    assert_eq!(cache.count_rows(&scope).await.unwrap(), 100);
    assert_eq!(api.requests(), 5);

    let result = mediator.load(LoadType::Append, &state).await;
    assert!(result.is_end_of_pagination());
    assert_eq!(api.requests(), 5);

    let rows = cache.load_rows(&scope).await.unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (0..100).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_refresh_replaces_previous_pages() {
    // Arrange
    let db = Database::open_in_memory().unwrap();
    let api = Arc::new(FakeTmdb::default());
    let clock = ManualClock::at(t0());
    let mediator = top_rated(db, &api, Arc::clone(&clock));
    let scope = mediator.scope().clone();
    let state = PagingState::default();
    mediator.load(LoadType::Refresh, &state).await;
    mediator.load(LoadType::Append, &state).await;
    clock.advance(TimeDelta::minutes(5));

    // Act
    let result = mediator.load(LoadType::Refresh, &state).await;

    // Assert
    assert!(result.is_success());
    let cache = mediator.cache();
    assert_eq!(cache.count_rows(&scope).await.unwrap(), 20);
    let key = cache.read_remote_key(&scope).await.unwrap().unwrap();
    assert_eq!(key.next_page, Some(2));
    assert_eq!(key.last_updated, t0() + TimeDelta::minutes(5));
}

#[tokio::test]
async fn test_cached_scope_survives_reopen_until_stale() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeTmdb::default());
    let clock = ManualClock::at(t0());
    {
        let db = Database::open(Some(dir.path())).unwrap();
        let mediator = top_rated(db, &api, Arc::clone(&clock));
        mediator
            .load(LoadType::Refresh, &PagingState::default())
            .await;
    }

    // Act
    let db = Database::open(Some(dir.path())).unwrap();
    let mediator = top_rated(db, &api, Arc::clone(&clock));
    clock.advance(TimeDelta::minutes(59));
    let fresh = mediator.initialize().await;
    clock.advance(TimeDelta::minutes(1));
    let stale = mediator.initialize().await;

    // Assert
    assert_eq!(fresh, InitializeAction::SkipInitialRefresh);
    assert_eq!(stale, InitializeAction::LaunchInitialRefresh);
    assert_eq!(
        mediator.cache().count_rows(mediator.scope()).await.unwrap(),
        20
    );
}

#[tokio::test]
async fn test_pager_stream_follows_sqlite_commits() {
    // Arrange
    let db = Database::open_in_memory().unwrap();
    let api = Arc::new(FakeTmdb::default());
    let pager = Pager::new(top_rated(db, &api, ManualClock::at(t0())));
    let mut stream = Box::pin(pager.stream());

    // Act
    let initial = stream.next().await.unwrap().unwrap();
    pager.start().await;
    let after_refresh = stream.next().await.unwrap().unwrap();
    pager.append().await;
    let after_append = stream.next().await.unwrap().unwrap();

    // Assert
    assert!(initial.is_empty());
    assert_eq!(after_refresh.len(), 20);
    assert_eq!(after_append.len(), 40);
    assert_eq!(after_append[20].id, 20);
}

#[tokio::test]
async fn test_now_playing_rows_share_one_locale() {
    // Arrange
    let db = Database::open_in_memory().unwrap();
    let api = Arc::new(FakeTmdb::default());
    let now_playing = |db: Database| {
        let fetcher = NowPlayingFetcher::new(Arc::clone(&api));
        let mediator = RemoteMediator::new(
            fetcher.scope(),
            fetcher,
            Arc::new(SqliteCache::now_playing(db)),
        )
        .with_clock(ManualClock::at(t0()));
        Pager::new(mediator)
    };
    let first = now_playing(db.clone());
    assert!(first.start().await.unwrap().is_success());

    // Act
    let second = now_playing(db);
    let skipped = second.start().await;
    let appended = second.append().await;

    // Assert
    assert!(skipped.is_none());
    assert!(appended.is_success());
    let rows = second.snapshot().await.unwrap();
    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|row| row.title.starts_with("en-US ")));
    assert_eq!(api.requests(), 2);
}
