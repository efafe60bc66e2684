//! Row projections of the TMDB DTOs kept for offline display.

use cinedex_api::tmdb::{TmdbMovie, TmdbTvShow};
use cinedex_paging::CachedRow;
use rusqlite::{Row, Statement};

/// Mapping between a cached row type and the columns of its tables.
///
/// Every list table shares `position` and `scope` ahead of these columns.
pub trait TableRow: CachedRow {
    /// Comma-separated row columns, in bind order, `id` first.
    const COLUMNS: &'static str;

    /// Placeholders for `scope` followed by [`Self::COLUMNS`].
    const PLACEHOLDERS: &'static str;

    /// Executes an insert statement prepared with `PLACEHOLDERS`.
    ///
    /// # Errors
    ///
    /// Returns the `SQLite` error of the insert.
    fn insert(&self, stmt: &mut Statement<'_>, scope: &str) -> rusqlite::Result<usize>;

    /// Reads a row selected with `COLUMNS`.
    ///
    /// # Errors
    ///
    /// Returns the `SQLite` error of a column conversion.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// A movie as stored in a list table.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMovie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    pub original_title: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Release date (YYYY-MM-DD).
    pub release_date: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Popularity score.
    pub popularity: f64,
    /// Vote average.
    pub vote_average: f64,
    /// Vote count.
    pub vote_count: u32,
}

impl CachedRow for CachedMovie {
    fn item_id(&self) -> u64 {
        self.id
    }
}

impl From<TmdbMovie> for CachedMovie {
    fn from(movie: TmdbMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            original_title: movie.original_title,
            overview: movie.overview,
            release_date: movie.release_date.filter(|d| !d.is_empty()),
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            popularity: movie.popularity,
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
        }
    }
}

impl TableRow for CachedMovie {
    const COLUMNS: &'static str = "id, title, original_title, overview, release_date, \
                                   poster_path, backdrop_path, popularity, vote_average, vote_count";
    const PLACEHOLDERS: &'static str = "?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11";

    fn insert(&self, stmt: &mut Statement<'_>, scope: &str) -> rusqlite::Result<usize> {
        stmt.execute(rusqlite::params![
            scope,
            self.id,
            self.title,
            self.original_title,
            self.overview,
            self.release_date,
            self.poster_path,
            self.backdrop_path,
            self.popularity,
            self.vote_average,
            self.vote_count,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            original_title: row.get(2)?,
            overview: row.get(3)?,
            release_date: row.get(4)?,
            poster_path: row.get(5)?,
            backdrop_path: row.get(6)?,
            popularity: row.get(7)?,
            vote_average: row.get(8)?,
            vote_count: row.get(9)?,
        })
    }
}

/// A TV series as stored in a list table.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTvShow {
    /// TMDB series ID.
    pub id: u64,
    /// Localized name.
    pub name: String,
    /// Original name.
    pub original_name: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// First air date (YYYY-MM-DD).
    pub first_air_date: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Popularity score.
    pub popularity: f64,
    /// Vote average.
    pub vote_average: f64,
    /// Vote count.
    pub vote_count: u32,
}

impl CachedRow for CachedTvShow {
    fn item_id(&self) -> u64 {
        self.id
    }
}

impl From<TmdbTvShow> for CachedTvShow {
    fn from(show: TmdbTvShow) -> Self {
        Self {
            id: show.id,
            name: show.name,
            original_name: show.original_name,
            overview: show.overview,
            first_air_date: show.first_air_date.filter(|d| !d.is_empty()),
            poster_path: show.poster_path,
            backdrop_path: show.backdrop_path,
            popularity: show.popularity,
            vote_average: show.vote_average,
            vote_count: show.vote_count,
        }
    }
}

impl TableRow for CachedTvShow {
    const COLUMNS: &'static str = "id, name, original_name, overview, first_air_date, \
                                   poster_path, backdrop_path, popularity, vote_average, vote_count";
    const PLACEHOLDERS: &'static str = "?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11";

    fn insert(&self, stmt: &mut Statement<'_>, scope: &str) -> rusqlite::Result<usize> {
        stmt.execute(rusqlite::params![
            scope,
            self.id,
            self.name,
            self.original_name,
            self.overview,
            self.first_air_date,
            self.poster_path,
            self.backdrop_path,
            self.popularity,
            self.vote_average,
            self.vote_count,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            original_name: row.get(2)?,
            overview: row.get(3)?,
            first_air_date: row.get(4)?,
            poster_path: row.get(5)?,
            backdrop_path: row.get(6)?,
            popularity: row.get(7)?,
            vote_average: row.get(8)?,
            vote_count: row.get(9)?,
        })
    }
}
