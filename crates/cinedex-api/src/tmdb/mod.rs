//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 list, search and related-title
//! endpoints, and binds each catalog list to a page fetcher.

mod api;
mod client;
mod fetchers;
mod images;
mod throttle;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use fetchers::{
    MovieListFetcher, MovieSearchFetcher, NOW_PLAYING_COLLECTION, NowPlayingFetcher,
    ON_THE_AIR_COLLECTION, OnTheAirFetcher, RelatedMoviesFetcher, RelatedTvFetcher,
    TvListFetcher, TvSearchFetcher,
};
pub use images::ImageConfig;
#[allow(clippy::module_name_repetitions)]
pub use types::{
    DiscoverParams, ListParams, MovieList, Relation, SearchMovieParams, SearchTvParams,
    TimeWindow, TmdbConfiguration, TmdbErrorResponse, TmdbImagesConfiguration, TmdbMovie,
    TmdbPage, TmdbTvShow, TvList,
};
