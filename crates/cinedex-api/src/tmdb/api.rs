//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use cinedex_paging::FetchError;

use super::types::{
    ListParams, MovieList, Relation, SearchMovieParams, SearchTvParams, TmdbConfiguration,
    TmdbMovie, TmdbPage, TmdbTvShow, TvList,
};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
///
/// Every method fails with [`FetchError::Network`] on transport failures,
/// [`FetchError::Protocol`] on non-success statuses and
/// [`FetchError::Decode`] when the body does not match the expected shape.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches one page of a movie list.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn movie_list(
        &self,
        list: &MovieList,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError>;

    /// Fetches one page of a TV list.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn tv_list(
        &self,
        list: &TvList,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError>;

    /// Searches for movies.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn search_movie(
        &self,
        params: &SearchMovieParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError>;

    /// Searches for TV series.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn search_tv(&self, params: &SearchTvParams) -> Result<TmdbPage<TmdbTvShow>, FetchError>;

    /// Fetches movies related to `movie_id`.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn related_movies(
        &self,
        movie_id: u64,
        relation: Relation,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError>;

    /// Fetches TV series related to `series_id`.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn related_tv(
        &self,
        series_id: u64,
        relation: Relation,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError>;

    /// Fetches the API configuration (image CDN settings).
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    async fn configuration(&self) -> Result<TmdbConfiguration, FetchError>;
}
