//! `TmdbClient` - TMDB API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use cinedex_paging::FetchError;
use reqwest::{Client, StatusCode};
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::throttle::RequestThrottle;
use super::types::{
    ListParams, MovieList, Relation, SearchMovieParams, SearchTvParams, TmdbConfiguration,
    TmdbErrorResponse, TmdbMovie, TmdbPage, TmdbTvShow, TvList,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Default backoff unit between retries, multiplied by the attempt number.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Default TCP connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Request spacing shared by every call on this client.
    throttle: RequestThrottle,
    /// Backoff unit for 429 retries.
    retry_backoff: Duration,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
    connect_timeout: Duration,
    timeout: Duration,
    retry_backoff: Duration,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            min_interval: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Sets the TCP connect timeout (default: 10s).
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the whole-request timeout (default: 30s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the 429 backoff unit (default: 1s).
    #[must_use]
    pub const fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_token = self.api_token.context("api_token is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let throttle = self
            .min_interval
            .map_or_else(RequestThrottle::default_interval, RequestThrottle::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token,
            throttle,
            retry_backoff: self.retry_backoff,
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a GET request with Bearer auth, query params, and throttling.
    /// Retries up to `MAX_RETRIES` times on HTTP 429.
    #[instrument(skip(self, query))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::invalid_request(format!("invalid request path: {path}"), e))?;

        let mut retries = 0u32;
        loop {
            self.throttle.acquire().await;

            let request = self
                .http_client
                .get(url.clone())
                .bearer_auth(&self.api_token)
                .query(query)
                .build()
                .map_err(|e| {
                    FetchError::invalid_request(format!("failed to build request: {path}"), e)
                })?;

            tracing::debug!(url = %request.url(), "TMDB API request");

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| FetchError::network(format!("request failed: {path}"), e))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    return Err(FetchError::protocol(
                        status.as_u16(),
                        format!("rate limit exceeded after {MAX_RETRIES} retries: {path}"),
                    ));
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "TMDB API rate limited (429). Retrying..."
                );
                tokio::time::sleep(self.retry_backoff.saturating_mul(retries)).await;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<failed to read body>"));
                let message = serde_json::from_str::<TmdbErrorResponse>(&body)
                    .map_or(body, |error_response| error_response.status_message);
                return Err(FetchError::protocol(status.as_u16(), message));
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::network(format!("failed to read response body: {path}"), e))?;
            return serde_json::from_str(&body)
                .map_err(|e| FetchError::decode(format!("unexpected response shape: {path}"), e));
        }
    }
}

/// Query pairs shared by the list endpoints.
fn list_query(params: &ListParams) -> Vec<(&'static str, String)> {
    let mut query: Vec<(&str, String)> = vec![
        ("language", params.language.clone()),
        ("page", params.page.to_string()),
    ];
    if let Some(ref region) = params.region {
        query.push(("region", region.clone()));
    }
    query
}

impl TmdbApi for TmdbClient {
    #[instrument(skip(self, params))]
    async fn movie_list(
        &self,
        list: &MovieList,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        let mut query = list_query(params);
        query.extend(list.query());
        self.get_json(&list.path(), &query).await
    }

    #[instrument(skip(self, params))]
    async fn tv_list(
        &self,
        list: &TvList,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        let mut query = list_query(params);
        query.extend(list.query());
        self.get_json(&list.path(), &query).await
    }

    #[instrument(skip_all)]
    async fn search_movie(
        &self,
        params: &SearchMovieParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(year) = params.primary_release_year {
            query.push(("primary_release_year", year.to_string()));
        }
        if let Some(ref region) = params.region {
            query.push(("region", region.clone()));
        }

        self.get_json("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn search_tv(&self, params: &SearchTvParams) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(year) = params.first_air_date_year {
            query.push(("first_air_date_year", year.to_string()));
        }

        self.get_json("search/tv", &query).await
    }

    #[instrument(skip(self, params))]
    async fn related_movies(
        &self,
        movie_id: u64,
        relation: Relation,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbMovie>, FetchError> {
        let path = format!("movie/{movie_id}/{}", relation.as_str());
        self.get_json(&path, &list_query(params)).await
    }

    #[instrument(skip(self, params))]
    async fn related_tv(
        &self,
        series_id: u64,
        relation: Relation,
        params: &ListParams,
    ) -> Result<TmdbPage<TmdbTvShow>, FetchError> {
        let path = format!("tv/{series_id}/{}", relation.as_str());
        self.get_json(&path, &list_query(params)).await
    }

    #[instrument(skip_all)]
    async fn configuration(&self) -> Result<TmdbConfiguration, FetchError> {
        self.get_json("configuration", &[]).await
    }
}
