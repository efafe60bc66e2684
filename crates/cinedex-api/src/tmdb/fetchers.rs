//! `NetworkFetcher` bindings for every TMDB collection kind.
//!
//! Each fetcher carries the dimensions of one scope and asks the API for a
//! single page at a time; the mediator or page source only supplies the
//! page number.

use std::sync::Arc;

use cinedex_paging::{FetchError, NetworkFetcher, Page, Scope};

use super::api::TmdbApi;
use super::types::{
    ListParams, MovieList, Relation, SearchMovieParams, SearchTvParams, TmdbMovie, TmdbPage,
    TmdbTvShow, TvList,
};

/// Collection of the singleton now-playing movie cache.
pub const NOW_PLAYING_COLLECTION: &str = "now_playing_movies";

/// Collection of the singleton on-the-air TV cache.
pub const ON_THE_AIR_COLLECTION: &str = "on_the_air_tv_shows";

/// Adds the list-specific dimensions (trending window, discover filters).
fn with_list_dimensions(scope: Scope, window: Option<&str>, query: Vec<(&str, String)>) -> Scope {
    let scope = scope.with_opt("window", window);
    query
        .into_iter()
        .fold(scope, |scope, (name, value)| scope.with(name, value))
}

fn with_list_params(scope: Scope, params: &ListParams) -> Scope {
    scope
        .with("language", params.language.clone())
        .with_opt("region", params.region.clone())
}

/// Pages of one movie list (`top_rated`, `popular`, `discover`, ...).
#[derive(Debug)]
pub struct MovieListFetcher<A> {
    api: Arc<A>,
    list: MovieList,
    params: ListParams,
}

impl<A> MovieListFetcher<A> {
    /// Binds `list` with the given language and region.
    pub const fn new(api: Arc<A>, list: MovieList, params: ListParams) -> Self {
        Self { api, list, params }
    }

    /// The list this fetcher serves.
    #[must_use]
    pub const fn list(&self) -> &MovieList {
        &self.list
    }

    /// Scope served by this fetcher, e.g. `movies/top_rated?language=en-US`.
    #[must_use]
    pub fn scope(&self) -> Scope {
        let window = match &self.list {
            MovieList::Trending(window) => Some(window.as_str()),
            _ => None,
        };
        let scope = Scope::new(format!("movies/{}", self.list.name()));
        let scope = with_list_dimensions(scope, window, self.list.query());
        with_list_params(scope, &self.params)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for MovieListFetcher<A> {
    type Item = TmdbMovie;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbMovie>, FetchError> {
        let params = self.params.clone().page(page);
        let response = self.api.movie_list(&self.list, &params).await?;
        Ok(response.into_page())
    }
}

/// Pages of one TV list (`top_rated`, `popular`, `discover`, ...).
#[derive(Debug)]
pub struct TvListFetcher<A> {
    api: Arc<A>,
    list: TvList,
    params: ListParams,
}

impl<A> TvListFetcher<A> {
    /// Binds `list` with the given language and region.
    pub const fn new(api: Arc<A>, list: TvList, params: ListParams) -> Self {
        Self { api, list, params }
    }

    /// The list this fetcher serves.
    #[must_use]
    pub const fn list(&self) -> &TvList {
        &self.list
    }

    /// Scope served by this fetcher, e.g. `tv/popular?language=en-US`.
    #[must_use]
    pub fn scope(&self) -> Scope {
        let window = match &self.list {
            TvList::Trending(window) => Some(window.as_str()),
            _ => None,
        };
        let scope = Scope::new(format!("tv/{}", self.list.name()));
        let scope = with_list_dimensions(scope, window, self.list.query());
        with_list_params(scope, &self.params)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for TvListFetcher<A> {
    type Item = TmdbTvShow;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbTvShow>, FetchError> {
        let params = self.params.clone().page(page);
        let response = self.api.tv_list(&self.list, &params).await?;
        Ok(response.into_page())
    }
}

/// Pages of `movie/now_playing` for the singleton now-playing cache.
///
/// The scope carries no dimension: there is exactly one now-playing cache,
/// so every page is requested in the default locale.
#[derive(Debug)]
pub struct NowPlayingFetcher<A> {
    inner: MovieListFetcher<A>,
}

impl<A> NowPlayingFetcher<A> {
    /// Binds `movie/now_playing` in the default locale.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            inner: MovieListFetcher::new(api, MovieList::NowPlaying, ListParams::default()),
        }
    }

    /// Always [`NOW_PLAYING_COLLECTION`].
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new(NOW_PLAYING_COLLECTION)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for NowPlayingFetcher<A> {
    type Item = TmdbMovie;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbMovie>, FetchError> {
        self.inner.fetch(page).await
    }
}

/// Pages of `tv/on_the_air` for the singleton on-the-air cache.
#[derive(Debug)]
pub struct OnTheAirFetcher<A> {
    inner: TvListFetcher<A>,
}

impl<A> OnTheAirFetcher<A> {
    /// Binds `tv/on_the_air` in the default locale.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            inner: TvListFetcher::new(api, TvList::OnTheAir, ListParams::default()),
        }
    }

    /// Always [`ON_THE_AIR_COLLECTION`].
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new(ON_THE_AIR_COLLECTION)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for OnTheAirFetcher<A> {
    type Item = TmdbTvShow;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbTvShow>, FetchError> {
        self.inner.fetch(page).await
    }
}

/// Pages of `search/movie` for one query.
#[derive(Debug)]
pub struct MovieSearchFetcher<A> {
    api: Arc<A>,
    params: SearchMovieParams,
}

impl<A> MovieSearchFetcher<A> {
    /// Binds the query and filters in `params`; its page is ignored.
    pub const fn new(api: Arc<A>, params: SearchMovieParams) -> Self {
        Self { api, params }
    }

    /// Scope served by this fetcher.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new("search/movie")
            .with("query", self.params.query.clone())
            .with("language", self.params.language.clone())
            .with_opt("region", self.params.region.clone())
            .with_opt(
                "year",
                self.params.primary_release_year.map(|y| y.to_string()),
            )
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for MovieSearchFetcher<A> {
    type Item = TmdbMovie;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbMovie>, FetchError> {
        let params = self.params.clone().page(page);
        self.api.search_movie(&params).await.map(TmdbPage::into_page)
    }
}

/// Pages of `search/tv` for one query.
#[derive(Debug)]
pub struct TvSearchFetcher<A> {
    api: Arc<A>,
    params: SearchTvParams,
}

impl<A> TvSearchFetcher<A> {
    /// Binds the query and filters in `params`; its page is ignored.
    pub const fn new(api: Arc<A>, params: SearchTvParams) -> Self {
        Self { api, params }
    }

    /// Scope served by this fetcher.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new("search/tv")
            .with("query", self.params.query.clone())
            .with("language", self.params.language.clone())
            .with_opt(
                "year",
                self.params.first_air_date_year.map(|y| y.to_string()),
            )
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for TvSearchFetcher<A> {
    type Item = TmdbTvShow;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbTvShow>, FetchError> {
        let params = self.params.clone().page(page);
        self.api.search_tv(&params).await.map(TmdbPage::into_page)
    }
}

/// Pages of movies similar to, or recommended from, one movie.
#[derive(Debug)]
pub struct RelatedMoviesFetcher<A> {
    api: Arc<A>,
    movie_id: u64,
    relation: Relation,
    params: ListParams,
}

impl<A> RelatedMoviesFetcher<A> {
    /// Binds the source movie and relation.
    pub const fn new(api: Arc<A>, movie_id: u64, relation: Relation, params: ListParams) -> Self {
        Self {
            api,
            movie_id,
            relation,
            params,
        }
    }

    /// Scope served by this fetcher.
    #[must_use]
    pub fn scope(&self) -> Scope {
        let scope = Scope::new(format!("movie/{}", self.relation.as_str()))
            .with("id", self.movie_id.to_string());
        with_list_params(scope, &self.params)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for RelatedMoviesFetcher<A> {
    type Item = TmdbMovie;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbMovie>, FetchError> {
        let params = self.params.clone().page(page);
        self.api
            .related_movies(self.movie_id, self.relation, &params)
            .await
            .map(TmdbPage::into_page)
    }
}

/// Pages of series similar to, or recommended from, one series.
#[derive(Debug)]
pub struct RelatedTvFetcher<A> {
    api: Arc<A>,
    series_id: u64,
    relation: Relation,
    params: ListParams,
}

impl<A> RelatedTvFetcher<A> {
    /// Binds the source series and relation.
    pub const fn new(api: Arc<A>, series_id: u64, relation: Relation, params: ListParams) -> Self {
        Self {
            api,
            series_id,
            relation,
            params,
        }
    }

    /// Scope served by this fetcher.
    #[must_use]
    pub fn scope(&self) -> Scope {
        let scope = Scope::new(format!("tv/{}", self.relation.as_str()))
            .with("id", self.series_id.to_string());
        with_list_params(scope, &self.params)
    }
}

impl<A: TmdbApi + Sync> NetworkFetcher for RelatedTvFetcher<A> {
    type Item = TmdbTvShow;

    async fn fetch(&self, page: u32) -> Result<Page<TmdbTvShow>, FetchError> {
        let params = self.params.clone().page(page);
        self.api
            .related_tv(self.series_id, self.relation, &params)
            .await
            .map(TmdbPage::into_page)
    }
}
