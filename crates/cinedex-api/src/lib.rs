//! API client library for cinedex.
//!
//! Provides the TMDB client and the page fetchers bound to each catalog list.

/// TMDB API client.
pub mod tmdb;
