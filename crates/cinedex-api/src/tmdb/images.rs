//! Image URL construction from a configuration snapshot.

use super::types::TmdbConfiguration;

/// Default image CDN base.
const DEFAULT_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Preferred poster width.
const DEFAULT_POSTER_SIZE: &str = "w342";

/// Preferred backdrop width.
const DEFAULT_BACKDROP_SIZE: &str = "w780";

/// Read-only snapshot of the image CDN settings.
///
/// Built once from the `configuration` endpoint (or the defaults) and passed
/// to whoever renders full image URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    base_url: String,
    poster_size: String,
    backdrop_size: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            poster_size: String::from(DEFAULT_POSTER_SIZE),
            backdrop_size: String::from(DEFAULT_BACKDROP_SIZE),
        }
    }
}

impl From<&TmdbConfiguration> for ImageConfig {
    fn from(config: &TmdbConfiguration) -> Self {
        let images = &config.images;
        let base_url = if images.secure_base_url.ends_with('/') {
            images.secure_base_url.clone()
        } else {
            format!("{}/", images.secure_base_url)
        };
        Self {
            base_url,
            poster_size: pick_size(&images.poster_sizes, DEFAULT_POSTER_SIZE),
            backdrop_size: pick_size(&images.backdrop_sizes, DEFAULT_BACKDROP_SIZE),
        }
    }
}

/// The preferred size when offered, else the first offered, else the preferred.
fn pick_size(available: &[String], preferred: &str) -> String {
    if available.is_empty() || available.iter().any(|s| s == preferred) {
        return String::from(preferred);
    }
    available
        .first()
        .map_or_else(|| String::from(preferred), Clone::clone)
}

impl ImageConfig {
    /// Full poster URL for a relative `poster_path`.
    #[must_use]
    pub fn poster_url(&self, path: Option<&str>) -> Option<String> {
        self.url(&self.poster_size, path)
    }

    /// Full backdrop URL for a relative `backdrop_path`.
    #[must_use]
    pub fn backdrop_url(&self, path: Option<&str>) -> Option<String> {
        self.url(&self.backdrop_size, path)
    }

    fn url(&self, size: &str, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        let path = path.strip_prefix('/').unwrap_or(path);
        Some(format!("{}{size}/{path}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_poster_url() {
        // Arrange
        let config = ImageConfig::default();

        // Act
        let url = config.poster_url(Some("/9cqNxx0GxF0bflZmeSMuL5tnGzr.jpg"));

        // Assert
        assert_eq!(
            url.as_deref(),
            Some("https://image.tmdb.org/t/p/w342/9cqNxx0GxF0bflZmeSMuL5tnGzr.jpg")
        );
    }

    #[test]
    fn test_missing_path_has_no_url() {
        // Arrange
        let config = ImageConfig::default();

        // Act & Assert
        assert_eq!(config.backdrop_url(None), None);
        assert_eq!(config.backdrop_url(Some("  ")), None);
    }

    #[test]
    fn test_from_configuration_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/configuration.json");
        let configuration: TmdbConfiguration = serde_json::from_str(json).unwrap();

        // Act
        let config = ImageConfig::from(&configuration);

        // Assert
        assert_eq!(config, ImageConfig::default());
    }

    #[test]
    fn test_unavailable_size_falls_back_to_first_offered() {
        // Arrange
        let json = r#"{"images":{"secure_base_url":"https://cdn.example.org/img","poster_sizes":["w185","original"],"backdrop_sizes":[]}}"#;
        let configuration: TmdbConfiguration = serde_json::from_str(json).unwrap();

        // Act
        let config = ImageConfig::from(&configuration);

        // Assert
        assert_eq!(
            config.poster_url(Some("/p.jpg")).as_deref(),
            Some("https://cdn.example.org/img/w185/p.jpg")
        );
        assert_eq!(
            config.backdrop_url(Some("b.jpg")).as_deref(),
            Some("https://cdn.example.org/img/w780/b.jpg")
        );
    }
}
