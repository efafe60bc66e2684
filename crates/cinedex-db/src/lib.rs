//! Database module for the offline catalog cache.
//!
//! Uses `rusqlite` (bundled `SQLite`) to persist paged TMDB lists together
//! with their remote keys, plus the user's favourites and browsing history.

/// Paged list cache implementing `LocalCache`.
pub mod cache;
mod connection;
mod database;
/// Favourite titles.
pub mod favourites;
/// Recently browsed titles.
pub mod history;
mod media;
mod migrations;
/// Cached row projections.
pub mod rows;

#[allow(clippy::module_name_repetitions)]
pub use cache::{CacheEntry, SqliteCache, clear_all, list_remote_keys};
#[allow(clippy::module_name_repetitions)]
pub use connection::open_db;
pub use database::Database;
pub use favourites::{Favourite, is_favourite, like, list_favourites, unlike};
pub use history::{Visit, list_recent, record_visit};
pub use media::MediaKind;
pub use rows::{CachedMovie, CachedTvShow, TableRow};
