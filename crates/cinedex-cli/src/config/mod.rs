//! Application configuration module.
//!
//! Manages the TOML config file: TMDB request settings, cache lifetimes and
//! the browsing history size.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, CacheConfig, TmdbConfig};
pub use paths::resolve_config_path;
