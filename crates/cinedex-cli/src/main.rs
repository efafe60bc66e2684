//! cinedex - offline-first TMDB movie and TV catalog browser.

/// Cache-backed and uncached paging helpers.
mod catalog;
/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::catalog::{cached_pager, fetch_uncached, page_through};
use crate::config::{AppConfig, TmdbConfig, resolve_config_path};
use cinedex_api::tmdb::{
    DiscoverParams, ImageConfig, ListParams, MovieList, MovieListFetcher, MovieSearchFetcher,
    NowPlayingFetcher, OnTheAirFetcher, RelatedMoviesFetcher, RelatedTvFetcher, Relation,
    SearchMovieParams, SearchTvParams, TimeWindow, TmdbApi, TmdbClient, TmdbMovie, TmdbTvShow,
    TvList, TvListFetcher, TvSearchFetcher,
};
use cinedex_db::{
    CachedMovie, CachedTvShow, Database, Favourite, MediaKind, SqliteCache, Visit, clear_all,
    is_favourite, like, list_favourites, list_recent, list_remote_keys, open_db, record_visit,
    unlike,
};
use cinedex_paging::{LocalCache, NetworkFetcher, NetworkPageSource, Scope};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse cached catalog lists.
    Browse(BrowseCommand),
    /// Search TMDB (not cached).
    Search(SearchCommand),
    /// Similar titles and recommendations (not cached).
    Related(RelatedCommand),
    /// Manage favourite titles.
    Favourites(FavouritesCommand),
    /// Recently browsed titles.
    History(HistoryCommand),
    /// Inspect or clear the list cache.
    Cache(CacheCommand),
}

/// Arguments for the `browse` subcommand.
#[derive(clap::Args)]
struct BrowseCommand {
    /// Browse subcommand to run.
    #[command(subcommand)]
    command: BrowseSubcommands,
}

/// Available browse subcommands.
#[derive(Subcommand)]
enum BrowseSubcommands {
    /// A movie list.
    Movies(BrowseMoviesArgs),
    /// A TV list.
    Tv(BrowseTvArgs),
    /// Movies now playing in theatres.
    NowPlaying(BrowseSingletonArgs),
    /// TV series currently on the air.
    OnTheAir(BrowseSingletonArgs),
}

/// Movie lists available through `browse movies`.
#[derive(Clone, Copy, ValueEnum)]
enum MovieListArg {
    /// Top rated movies.
    TopRated,
    /// Popular movies.
    Popular,
    /// Upcoming releases.
    Upcoming,
    /// Trending movies (see --window).
    Trending,
    /// Discover with sort/filter options.
    Discover,
}

/// TV lists available through `browse tv`.
#[derive(Clone, Copy, ValueEnum)]
enum TvListArg {
    /// Top rated series.
    TopRated,
    /// Popular series.
    Popular,
    /// Series airing today.
    AiringToday,
    /// Trending series (see --window).
    Trending,
    /// Discover with sort/filter options.
    Discover,
}

/// Trending time window.
#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    Week,
}

impl From<WindowArg> for TimeWindow {
    fn from(window: WindowArg) -> Self {
        match window {
            WindowArg::Day => Self::Day,
            WindowArg::Week => Self::Week,
        }
    }
}

/// Movie or TV series.
#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// A movie.
    Movie,
    /// A TV series.
    Tv,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => Self::Movie,
            KindArg::Tv => Self::Tv,
        }
    }
}

/// Related-title relation.
#[derive(Clone, Copy, ValueEnum)]
enum RelationArg {
    /// Titles similar in genre and keywords.
    Similar,
    /// TMDB recommendations.
    Recommendations,
}

impl From<RelationArg> for Relation {
    fn from(relation: RelationArg) -> Self {
        match relation {
            RelationArg::Similar => Self::Similar,
            RelationArg::Recommendations => Self::Recommendations,
        }
    }
}

/// Language and region overrides.
#[derive(clap::Args)]
struct LocaleArgs {
    /// Response language (default: config `tmdb.language`).
    #[arg(long)]
    language: Option<String>,
    /// Region filter, ISO 3166-1 (default: config `tmdb.region`).
    #[arg(long)]
    region: Option<String>,
}

impl LocaleArgs {
    fn list_params(&self, config: &TmdbConfig) -> ListParams {
        ListParams::default()
            .language(self.language.as_ref().unwrap_or(&config.language))
            .region(self.region.clone().or_else(|| config.region.clone()))
    }
}

/// Cache paging options.
#[derive(clap::Args)]
struct PagingArgs {
    /// Pages to load (the first may come from a fresh cache).
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Reload from page 1 even if the cache is fresh.
    #[arg(long)]
    refresh: bool,
    /// Print poster URLs (fetches the image configuration).
    #[arg(long)]
    with_images: bool,
}

/// Discover sort and filter options.
#[derive(clap::Args)]
struct DiscoverArgs {
    /// Sort order (e.g. "popularity.desc").
    #[arg(long)]
    sort_by: Option<String>,
    /// Comma-separated genre IDs.
    #[arg(long)]
    genres: Option<String>,
    /// Release or first-air year.
    #[arg(long)]
    year: Option<u32>,
    /// Minimum vote count.
    #[arg(long)]
    min_votes: Option<u32>,
}

impl DiscoverArgs {
    fn params(&self) -> DiscoverParams {
        DiscoverParams {
            sort_by: self.sort_by.clone(),
            with_genres: self.genres.clone(),
            year: self.year,
            vote_count_gte: self.min_votes,
        }
    }
}

/// Arguments for the `browse movies` subcommand.
#[derive(clap::Args)]
struct BrowseMoviesArgs {
    /// List to browse.
    #[arg(long, value_enum, default_value = "popular")]
    list: MovieListArg,
    /// Trending window.
    #[arg(long, value_enum, default_value = "day")]
    window: WindowArg,
    /// Locale options.
    #[command(flatten)]
    locale: LocaleArgs,
    /// Discover options (only used with `--list discover`).
    #[command(flatten)]
    discover: DiscoverArgs,
    /// Paging options.
    #[command(flatten)]
    paging: PagingArgs,
}

impl BrowseMoviesArgs {
    fn movie_list(&self) -> MovieList {
        match self.list {
            MovieListArg::TopRated => MovieList::TopRated,
            MovieListArg::Popular => MovieList::Popular,
            MovieListArg::Upcoming => MovieList::Upcoming,
            MovieListArg::Trending => MovieList::Trending(self.window.into()),
            MovieListArg::Discover => MovieList::Discover(self.discover.params()),
        }
    }
}

/// Arguments for the `browse tv` subcommand.
#[derive(clap::Args)]
struct BrowseTvArgs {
    /// List to browse.
    #[arg(long, value_enum, default_value = "popular")]
    list: TvListArg,
    /// Trending window.
    #[arg(long, value_enum, default_value = "day")]
    window: WindowArg,
    /// Locale options.
    #[command(flatten)]
    locale: LocaleArgs,
    /// Discover options (only used with `--list discover`).
    #[command(flatten)]
    discover: DiscoverArgs,
    /// Paging options.
    #[command(flatten)]
    paging: PagingArgs,
}

impl BrowseTvArgs {
    fn tv_list(&self) -> TvList {
        match self.list {
            TvListArg::TopRated => TvList::TopRated,
            TvListArg::Popular => TvList::Popular,
            TvListArg::AiringToday => TvList::AiringToday,
            TvListArg::Trending => TvList::Trending(self.window.into()),
            TvListArg::Discover => TvList::Discover(self.discover.params()),
        }
    }
}

/// Arguments for `browse now-playing` and `browse on-the-air`.
///
/// These lists have a single cache each, always fetched in the default
/// locale, so they take no language or region.
#[derive(clap::Args)]
struct BrowseSingletonArgs {
    /// Paging options.
    #[command(flatten)]
    paging: PagingArgs,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchCommand {
    /// Search subcommand to run.
    #[command(subcommand)]
    command: SearchSubcommands,
}

/// Available search subcommands.
#[derive(Subcommand)]
enum SearchSubcommands {
    /// Search for movies.
    Movies(SearchArgs),
    /// Search for TV series.
    Tv(SearchArgs),
}

/// Arguments for `search movies` and `search tv`.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Arrival").
    #[arg(long, required = true)]
    query: String,
    /// Filter by release or first-air year.
    #[arg(long)]
    year: Option<u32>,
    /// Locale options.
    #[command(flatten)]
    locale: LocaleArgs,
    /// Maximum number of pages to load.
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Only show titles with poster, backdrop and overview.
    #[arg(long)]
    complete_only: bool,
}

/// Arguments for the `related` subcommand.
#[derive(clap::Args)]
struct RelatedCommand {
    /// Related subcommand to run.
    #[command(subcommand)]
    command: RelatedSubcommands,
}

/// Available related subcommands.
#[derive(Subcommand)]
enum RelatedSubcommands {
    /// Titles related to a movie.
    Movie(RelatedArgs),
    /// Titles related to a TV series.
    Tv(RelatedArgs),
}

/// Arguments for `related movie` and `related tv`.
#[derive(clap::Args)]
struct RelatedArgs {
    /// TMDB ID of the source title.
    #[arg(long, required = true)]
    id: u64,
    /// Relation to follow.
    #[arg(long, value_enum, default_value = "similar")]
    kind: RelationArg,
    /// Locale options.
    #[command(flatten)]
    locale: LocaleArgs,
    /// Maximum number of pages to load.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

/// Arguments for the `favourites` subcommand.
#[derive(clap::Args)]
struct FavouritesCommand {
    /// Favourites subcommand to run.
    #[command(subcommand)]
    command: FavouritesSubcommands,
}

/// Available favourites subcommands.
#[derive(Subcommand)]
enum FavouritesSubcommands {
    /// Like a title.
    Add(FavouriteAddArgs),
    /// Unlike a title.
    Remove(TitleRefArgs),
    /// List liked titles, newest first.
    List(FavouriteListArgs),
}

/// A title reference.
#[derive(clap::Args)]
struct TitleRefArgs {
    /// Movie or TV series.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// TMDB ID.
    #[arg(long)]
    id: u64,
}

/// Arguments for the `favourites add` subcommand.
#[derive(clap::Args)]
struct FavouriteAddArgs {
    /// Title reference.
    #[command(flatten)]
    title_ref: TitleRefArgs,
    /// Display title.
    #[arg(long, required = true)]
    title: String,
    /// Poster image path (e.g. "/q6y0Go1tsGEsmtFryDOJo3dEmqu.jpg").
    #[arg(long)]
    poster_path: Option<String>,
}

/// Arguments for the `favourites list` subcommand.
#[derive(clap::Args)]
struct FavouriteListArgs {
    /// Only list this kind.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

/// Arguments for the `history` subcommand.
#[derive(clap::Args)]
struct HistoryCommand {
    /// History subcommand to run.
    #[command(subcommand)]
    command: HistorySubcommands,
}

/// Available history subcommands.
#[derive(Subcommand)]
enum HistorySubcommands {
    /// Record a visit to a title.
    Visit(VisitArgs),
    /// List recently browsed titles.
    List(HistoryListArgs),
}

/// Arguments for the `history visit` subcommand.
#[derive(clap::Args)]
struct VisitArgs {
    /// Title reference.
    #[command(flatten)]
    title_ref: TitleRefArgs,
    /// Display title.
    #[arg(long, required = true)]
    title: String,
}

/// Arguments for the `history list` subcommand.
#[derive(clap::Args)]
struct HistoryListArgs {
    /// Maximum number of entries (default: config `history.limit`).
    #[arg(long)]
    limit: Option<usize>,
}

/// Arguments for the `cache` subcommand.
#[derive(clap::Args)]
struct CacheCommand {
    /// Cache subcommand to run.
    #[command(subcommand)]
    command: CacheSubcommands,
}

/// Available cache subcommands.
#[derive(Subcommand)]
enum CacheSubcommands {
    /// Show cached lists and whether they are stale.
    Status,
    /// Delete every cached list. Favourites and history are kept.
    Clear,
}

/// Loads the config from `{dir}/config.toml` or the default location.
fn load_config(dir: Option<&Path>) -> Result<AppConfig> {
    let path = resolve_config_path(dir)?;
    AppConfig::load(&path)
}

/// Builds a `TmdbClient` from the `TMDB_API_TOKEN` environment variable.
///
/// # Errors
///
/// Returns an error if `TMDB_API_TOKEN` is not set or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &TmdbConfig) -> Result<TmdbClient> {
    let api_token = std::env::var("TMDB_API_TOKEN")
        .context("TMDB_API_TOKEN environment variable is required")?;

    let mut builder = TmdbClient::builder()
        .api_token(api_token)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .min_interval(Duration::from_millis(config.min_interval_ms))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs));
    if let Some(ref base_url) = config.base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid tmdb.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build TMDB client")
}

/// Fetches the image configuration when requested, falling back to defaults.
async fn image_config(client: &TmdbClient, wanted: bool) -> Option<ImageConfig> {
    if !wanted {
        return None;
    }
    match client.configuration().await {
        Ok(configuration) => Some(ImageConfig::from(&configuration)),
        Err(err) => {
            tracing::warn!(error = %err, "image configuration unavailable, using defaults");
            Some(ImageConfig::default())
        }
    }
}

fn print_movies(movies: &[CachedMovie], images: Option<&ImageConfig>) {
    tracing::info!("ID\tTitle\t\t\tReleaseDate\tRating");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{}\t{:.1}",
            movie.id,
            movie.title,
            movie.release_date.as_deref().unwrap_or("-"),
            movie.vote_average,
        );
        if let Some(url) = images.and_then(|i| i.poster_url(movie.poster_path.as_deref())) {
            tracing::info!("\tposter: {}", url);
        }
    }
    tracing::info!("Total: {} movies", movies.len());
}

fn print_tv_shows(shows: &[CachedTvShow], images: Option<&ImageConfig>) {
    tracing::info!("ID\tName\t\t\tFirstAirDate\tRating");
    for show in shows {
        tracing::info!(
            "{}\t{}\t{}\t{:.1}",
            show.id,
            show.name,
            show.first_air_date.as_deref().unwrap_or("-"),
            show.vote_average,
        );
        if let Some(url) = images.and_then(|i| i.poster_url(show.poster_path.as_deref())) {
            tracing::info!("\tposter: {}", url);
        }
    }
    tracing::info!("Total: {} series", shows.len());
}

/// Loads one cached collection and prints its rows.
///
/// `bind` turns the client and TMDB settings into the collection's scope and
/// fetcher; `table` opens the cache table the collection lives in.
///
/// # Errors
///
/// Returns an error if the client fails to build, a page fails to load or
/// the cache cannot be read.
#[instrument(skip_all)]
async fn run_browse<F, R>(
    dir: Option<&Path>,
    paging: &PagingArgs,
    bind: impl FnOnce(Arc<TmdbClient>, &TmdbConfig) -> (Scope, F),
    table: fn(Database) -> SqliteCache<R>,
    print: fn(&[R], Option<&ImageConfig>),
) -> Result<()>
where
    F: NetworkFetcher,
    F::Item: Send,
    R: From<F::Item>,
    SqliteCache<R>: LocalCache<Row = R> + 'static,
{
    let config = load_config(dir)?;
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);
    let db = Database::open(dir)?;

    let (scope, fetcher) = bind(Arc::clone(&client), &config.tmdb);
    let pager = cached_pager(scope, fetcher, table(db), &config.cache);
    let rows = page_through(&pager, paging.pages, paging.refresh).await?;

    let images = image_config(&client, paging.with_images).await;
    print(&rows, images.as_ref());
    Ok(())
}

/// Runs the `search movies` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page fails to load.
#[instrument(skip_all)]
async fn run_search_movies(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);

    let list = args.locale.list_params(&config.tmdb);
    let mut params = SearchMovieParams::new(&args.query)
        .language(list.language)
        .region(list.region);
    if let Some(year) = args.year {
        params = params.primary_release_year(year);
    }

    let mut source = NetworkPageSource::new(MovieSearchFetcher::new(client, params));
    if args.complete_only {
        source = source.with_filter(TmdbMovie::has_complete_artwork);
    }
    let results = fetch_uncached(&source, args.pages)
        .await
        .context("TMDB search/movie request failed")?;

    let movies: Vec<CachedMovie> = results.into_iter().map(CachedMovie::from).collect();
    print_movies(&movies, None);
    Ok(())
}

/// Runs the `search tv` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page fails to load.
#[instrument(skip_all)]
async fn run_search_tv(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);

    let language = args
        .locale
        .language
        .clone()
        .unwrap_or_else(|| config.tmdb.language.clone());
    let mut params = SearchTvParams::new(&args.query).language(language);
    if let Some(year) = args.year {
        params = params.first_air_date_year(year);
    }

    let mut source = NetworkPageSource::new(TvSearchFetcher::new(client, params));
    if args.complete_only {
        source = source.with_filter(TmdbTvShow::has_complete_artwork);
    }
    let results = fetch_uncached(&source, args.pages)
        .await
        .context("TMDB search/tv request failed")?;

    let shows: Vec<CachedTvShow> = results.into_iter().map(CachedTvShow::from).collect();
    print_tv_shows(&shows, None);
    Ok(())
}

/// Runs the `related movie` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page fails to load.
#[instrument(skip_all, fields(id = args.id))]
async fn run_related_movie(args: &RelatedArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);

    let fetcher = RelatedMoviesFetcher::new(
        client,
        args.id,
        args.kind.into(),
        args.locale.list_params(&config.tmdb),
    );
    let results = fetch_uncached(&NetworkPageSource::new(fetcher), args.pages).await?;

    let movies: Vec<CachedMovie> = results.into_iter().map(CachedMovie::from).collect();
    print_movies(&movies, None);
    Ok(())
}

/// Runs the `related tv` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a page fails to load.
#[instrument(skip_all, fields(id = args.id))]
async fn run_related_tv(args: &RelatedArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);

    let fetcher = RelatedTvFetcher::new(
        client,
        args.id,
        args.kind.into(),
        args.locale.list_params(&config.tmdb),
    );
    let results = fetch_uncached(&NetworkPageSource::new(fetcher), args.pages).await?;

    let shows: Vec<CachedTvShow> = results.into_iter().map(CachedTvShow::from).collect();
    print_tv_shows(&shows, None);
    Ok(())
}

/// Runs the `favourites add` subcommand.
///
/// # Errors
///
/// Returns an error if the database operation fails.
fn run_favourites_add(args: &FavouriteAddArgs, dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir)?;
    let kind = MediaKind::from(args.title_ref.kind);
    let existed = is_favourite(&conn, kind, args.title_ref.id)?;

    like(
        &conn,
        &Favourite {
            kind,
            id: args.title_ref.id,
            title: args.title.clone(),
            poster_path: args.poster_path.clone(),
            added_at: Utc::now(),
        },
    )?;

    if existed {
        tracing::info!("Updated favourite {} {}: {}", kind, args.title_ref.id, args.title);
    } else {
        tracing::info!("Added favourite {} {}: {}", kind, args.title_ref.id, args.title);
    }
    Ok(())
}

/// Runs the `favourites remove` subcommand.
///
/// # Errors
///
/// Returns an error if the database operation fails.
fn run_favourites_remove(args: &TitleRefArgs, dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir)?;
    let kind = MediaKind::from(args.kind);
    if unlike(&conn, kind, args.id)? {
        tracing::info!("Removed favourite {} {}", kind, args.id);
    } else {
        tracing::info!("{} {} is not a favourite", kind, args.id);
    }
    Ok(())
}

/// Runs the `favourites list` subcommand.
///
/// # Errors
///
/// Returns an error if the database query fails.
fn run_favourites_list(args: &FavouriteListArgs, dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir)?;
    let favourites = list_favourites(&conn, args.kind.map(MediaKind::from))?;

    if favourites.is_empty() {
        tracing::info!("No favourites yet. Run `favourites add` to like a title.");
        return Ok(());
    }

    tracing::info!("Kind\tID\tTitle\t\t\tAdded");
    for favourite in &favourites {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            favourite.kind,
            favourite.id,
            favourite.title,
            favourite.added_at.format("%Y-%m-%d %H:%M"),
        );
    }
    tracing::info!("Total: {} favourites", favourites.len());
    Ok(())
}

/// Runs the `history visit` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the database operation fails.
fn run_history_visit(args: &VisitArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let conn = open_db(dir)?;
    let visit = Visit {
        kind: args.title_ref.kind.into(),
        id: args.title_ref.id,
        title: args.title.clone(),
        visited_at: Utc::now(),
    };
    record_visit(&conn, &visit, config.history.limit)?;
    tracing::info!("Recorded visit to {} {}: {}", visit.kind, visit.id, visit.title);
    Ok(())
}

/// Runs the `history list` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the database query fails.
fn run_history_list(args: &HistoryListArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let conn = open_db(dir)?;
    let visits = list_recent(&conn, args.limit.unwrap_or(config.history.limit))?;

    if visits.is_empty() {
        tracing::info!("No recently browsed titles.");
        return Ok(());
    }

    tracing::info!("Kind\tID\tTitle\t\t\tVisited");
    for visit in &visits {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            visit.kind,
            visit.id,
            visit.title,
            visit.visited_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

/// Runs the `cache status` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the database query fails.
fn run_cache_status(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let conn = open_db(dir)?;
    let entries = list_remote_keys(&conn)?;

    if entries.is_empty() {
        tracing::info!("No cached lists. Run `browse` to fill the cache.");
        return Ok(());
    }

    let now = Utc::now();
    tracing::info!("Scope\t\t\t\tNextPage\tRows\tUpdated\t\t\tState");
    for entry in &entries {
        let collection = entry
            .key
            .scope
            .split_once('?')
            .map_or(entry.key.scope.as_str(), |(collection, _)| collection);
        let state = if entry.key.is_stale(now, config.cache.ttl_for(collection)) {
            "stale"
        } else {
            "fresh"
        };
        tracing::info!(
            "{}\t{}\t\t{}\t{}\t{}",
            entry.key.scope,
            entry
                .key
                .next_page
                .map_or_else(|| String::from("end"), |p| p.to_string()),
            entry.rows,
            entry.key.last_updated.format("%Y-%m-%d %H:%M:%S"),
            state,
        );
    }
    tracing::info!("Total: {} cached lists", entries.len());
    Ok(())
}

/// Runs the `cache clear` subcommand.
///
/// # Errors
///
/// Returns an error if the database operation fails.
fn run_cache_clear(dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir)?;
    let removed = clear_all(&conn)?;
    tracing::info!("Cleared {} cached rows", removed);
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Browse(browse) => match browse.command {
            BrowseSubcommands::Movies(args) => {
                let bind = |client: Arc<TmdbClient>, config: &TmdbConfig| {
                    let fetcher = MovieListFetcher::new(
                        client,
                        args.movie_list(),
                        args.locale.list_params(config),
                    );
                    (fetcher.scope(), fetcher)
                };
                run_browse(dir, &args.paging, bind, SqliteCache::movies, print_movies).await
            }
            BrowseSubcommands::Tv(args) => {
                let bind = |client: Arc<TmdbClient>, config: &TmdbConfig| {
                    let fetcher = TvListFetcher::new(
                        client,
                        args.tv_list(),
                        args.locale.list_params(config),
                    );
                    (fetcher.scope(), fetcher)
                };
                run_browse(dir, &args.paging, bind, SqliteCache::tv_shows, print_tv_shows).await
            }
            BrowseSubcommands::NowPlaying(args) => {
                let bind = |client: Arc<TmdbClient>, _: &TmdbConfig| {
                    let fetcher = NowPlayingFetcher::new(client);
                    (fetcher.scope(), fetcher)
                };
                run_browse(dir, &args.paging, bind, SqliteCache::now_playing, print_movies).await
            }
            BrowseSubcommands::OnTheAir(args) => {
                let bind = |client: Arc<TmdbClient>, _: &TmdbConfig| {
                    let fetcher = OnTheAirFetcher::new(client);
                    (fetcher.scope(), fetcher)
                };
                run_browse(dir, &args.paging, bind, SqliteCache::on_the_air, print_tv_shows)
                    .await
            }
        },
        Commands::Search(search) => match search.command {
            SearchSubcommands::Movies(args) => run_search_movies(&args, dir).await,
            SearchSubcommands::Tv(args) => run_search_tv(&args, dir).await,
        },
        Commands::Related(related) => match related.command {
            RelatedSubcommands::Movie(args) => run_related_movie(&args, dir).await,
            RelatedSubcommands::Tv(args) => run_related_tv(&args, dir).await,
        },
        Commands::Favourites(favourites) => match favourites.command {
            FavouritesSubcommands::Add(args) => run_favourites_add(&args, dir),
            FavouritesSubcommands::Remove(args) => run_favourites_remove(&args, dir),
            FavouritesSubcommands::List(args) => run_favourites_list(&args, dir),
        },
        Commands::History(history) => match history.command {
            HistorySubcommands::Visit(args) => run_history_visit(&args, dir),
            HistorySubcommands::List(args) => run_history_list(&args, dir),
        },
        Commands::Cache(cache) => match cache.command {
            CacheSubcommands::Status => run_cache_status(dir),
            CacheSubcommands::Clear => run_cache_clear(dir),
        },
    }
}
