//! `AppConfig` struct and TOML loading.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// TMDB request settings.
    pub tmdb: TmdbConfig,
    /// Cache lifetimes.
    pub cache: CacheConfig,
    /// Browsing history settings.
    pub history: HistoryConfig,
}

/// TMDB request settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// Default response language.
    pub language: String,
    /// Default region filter (ISO 3166-1).
    pub region: Option<String>,
    /// API base URL override.
    pub base_url: Option<String>,
    /// Minimum spacing between requests in milliseconds.
    pub min_interval_ms: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            language: String::from("en-US"),
            region: None,
            base_url: None,
            min_interval_ms: 25,
            connect_timeout_secs: 10,
            timeout_secs: 30,
        }
    }
}

/// Cache lifetimes.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Age in minutes after which a cached list is refreshed on startup.
    pub ttl_minutes: u64,
    /// Per-collection overrides of `ttl_minutes`, keyed by collection
    /// (e.g. `"movies/trending"`, `"now_playing_movies"`).
    pub ttl_overrides: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            ttl_overrides: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Cache lifetime of `collection`.
    #[must_use]
    pub fn ttl_for(&self, collection: &str) -> Duration {
        let minutes = self
            .ttl_overrides
            .get(collection)
            .copied()
            .unwrap_or(self.ttl_minutes);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// Browsing history settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of visits kept.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
