//! TMDB API response types and request parameters.

use cinedex_paging::Page;
use serde::Deserialize;

// --- Page envelope ---

/// Paged response envelope shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    /// Current page number.
    pub page: u32,
    /// Page results.
    pub results: Vec<T>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}

impl<T> TmdbPage<T> {
    /// Drops the envelope, keeping the items and page accounting.
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        Page::new(self.results, self.page, self.total_pages)
    }
}

// --- Movies ---

/// A movie entry from any movie list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Adult flag.
    #[serde(default)]
    pub adult: bool,
}

impl TmdbMovie {
    /// Poster, backdrop and a non-empty overview are all present.
    #[must_use]
    pub fn has_complete_artwork(&self) -> bool {
        has_complete_artwork(
            self.poster_path.as_deref(),
            self.backdrop_path.as_deref(),
            self.overview.as_deref(),
        )
    }
}

// --- TV ---

/// A TV series entry from any TV list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvShow {
    /// TMDB series ID.
    pub id: u64,
    /// Localized name.
    pub name: String,
    /// Original name.
    #[serde(default)]
    pub original_name: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Origin countries (ISO 3166-1).
    #[serde(default)]
    pub origin_country: Vec<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// First air date (YYYY-MM-DD, may be empty).
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl TmdbTvShow {
    /// Poster, backdrop and a non-empty overview are all present.
    #[must_use]
    pub fn has_complete_artwork(&self) -> bool {
        has_complete_artwork(
            self.poster_path.as_deref(),
            self.backdrop_path.as_deref(),
            self.overview.as_deref(),
        )
    }
}

fn has_complete_artwork(poster: Option<&str>, backdrop: Option<&str>, overview: Option<&str>) -> bool {
    let present = |s: Option<&str>| s.is_some_and(|s| !s.trim().is_empty());
    present(poster) && present(backdrop) && present(overview)
}

// --- Configuration ---

/// Response from `configuration` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfiguration {
    /// Image CDN settings.
    pub images: TmdbImagesConfiguration,
}

/// Image CDN settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImagesConfiguration {
    /// HTTPS base URL, e.g. `https://image.tmdb.org/t/p/`.
    pub secure_base_url: String,
    /// Available backdrop widths.
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    /// Available poster widths.
    #[serde(default)]
    pub poster_sizes: Vec<String>,
}

// --- Error ---

/// Error body returned by TMDB on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB internal status code.
    pub status_code: u32,
    /// Human-readable message.
    pub status_message: String,
    /// Always `false` for errors.
    #[serde(default)]
    pub success: bool,
}

// --- Lists ---

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    Week,
}

impl TimeWindow {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// Sort and filter parameters of the discover endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DiscoverParams {
    /// Sort order, e.g. `popularity.desc`.
    pub sort_by: Option<String>,
    /// Comma-separated genre IDs.
    pub with_genres: Option<String>,
    /// Release or first-air year.
    pub year: Option<u32>,
    /// Minimum vote count.
    pub vote_count_gte: Option<u32>,
}

impl DiscoverParams {
    /// Non-empty parameters as `(name, value)` pairs, in a fixed order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref sort_by) = self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        if let Some(ref genres) = self.with_genres {
            pairs.push(("with_genres", genres.clone()));
        }
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(count) = self.vote_count_gte {
            pairs.push(("vote_count.gte", count.to_string()));
        }
        pairs
    }
}

/// Movie catalog lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovieList {
    /// `movie/top_rated`.
    TopRated,
    /// `movie/popular`.
    Popular,
    /// `movie/upcoming`.
    Upcoming,
    /// `movie/now_playing`.
    NowPlaying,
    /// `trending/movie/{window}`.
    Trending(TimeWindow),
    /// `discover/movie`.
    Discover(DiscoverParams),
}

impl MovieList {
    /// Collection name, also the scope prefix.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TopRated => "top_rated",
            Self::Popular => "popular",
            Self::Upcoming => "upcoming",
            Self::NowPlaying => "now_playing",
            Self::Trending(_) => "trending",
            Self::Discover(_) => "discover",
        }
    }

    /// Request path relative to the API base.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Trending(window) => format!("trending/movie/{}", window.as_str()),
            Self::Discover(_) => String::from("discover/movie"),
            other => format!("movie/{}", other.name()),
        }
    }

    /// List-specific query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Discover(params) => params.pairs(),
            _ => Vec::new(),
        }
    }
}

/// TV catalog lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TvList {
    /// `tv/top_rated`.
    TopRated,
    /// `tv/popular`.
    Popular,
    /// `tv/on_the_air`.
    OnTheAir,
    /// `tv/airing_today`.
    AiringToday,
    /// `trending/tv/{window}`.
    Trending(TimeWindow),
    /// `discover/tv`.
    Discover(DiscoverParams),
}

impl TvList {
    /// Collection name, also the scope prefix.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TopRated => "top_rated",
            Self::Popular => "popular",
            Self::OnTheAir => "on_the_air",
            Self::AiringToday => "airing_today",
            Self::Trending(_) => "trending",
            Self::Discover(_) => "discover",
        }
    }

    /// Request path relative to the API base.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Trending(window) => format!("trending/tv/{}", window.as_str()),
            Self::Discover(_) => String::from("discover/tv"),
            other => format!("tv/{}", other.name()),
        }
    }

    /// List-specific query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Discover(params) => params.pairs(),
            _ => Vec::new(),
        }
    }
}

/// Relation of a related-titles list to its source title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `{id}/similar`.
    Similar,
    /// `{id}/recommendations`.
    Recommendations,
}

impl Relation {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Similar => "similar",
            Self::Recommendations => "recommendations",
        }
    }
}

// --- Parameters ---

/// Parameters shared by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Response language (default: "en-US").
    pub language: String,
    /// Region filter (ISO 3166-1).
    pub region: Option<String>,
    /// Result page (1-500, default: 1).
    pub page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            language: String::from("en-US"),
            region: None,
            page: 1,
        }
    }
}

impl ListParams {
    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the region filter.
    #[must_use]
    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Parameters for `search/tv` endpoint.
#[derive(Debug, Clone)]
pub struct SearchTvParams {
    /// Search query (required).
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Filter by first air date year.
    pub first_air_date_year: Option<u32>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchTvParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from("en-US"),
            page: 1,
            first_air_date_year: None,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the first air date year filter.
    #[must_use]
    pub const fn first_air_date_year(mut self, year: u32) -> Self {
        self.first_air_date_year = Some(year);
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Parameters for `search/movie` endpoint.
#[derive(Debug, Clone)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Filter by primary release year.
    pub primary_release_year: Option<u32>,
    /// Region filter (ISO 3166-1).
    pub region: Option<String>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from("en-US"),
            page: 1,
            primary_release_year: None,
            region: None,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the primary release year filter.
    #[must_use]
    pub const fn primary_release_year(mut self, year: u32) -> Self {
        self.primary_release_year = Some(year);
        self
    }

    /// Sets the region filter.
    #[must_use]
    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}
