//! Minimum spacing between TMDB requests.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Default minimum interval between requests (~40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Enforces a minimum interval between consecutive requests.
///
/// Callers queue on the internal lock, so concurrent fetchers sharing one
/// client are spaced out as well.
#[derive(Debug)]
pub struct RequestThrottle {
    /// Minimum interval between requests.
    min_interval: Duration,
    /// When the last request was let through.
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Creates a throttle with the given minimum interval.
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a throttle with the default interval (25ms).
    pub(crate) fn default_interval() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }

    /// Waits until the next request is allowed and claims the slot.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval.saturating_sub(elapsed)).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_first_request_does_not_wait() {
        // Arrange
        let throttle = RequestThrottle::new(Duration::from_secs(1));

        // Act
        let start = Instant::now();
        throttle.acquire().await;

        // Assert
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        // Arrange
        let throttle = Arc::new(RequestThrottle::new(Duration::from_millis(40)));

        // Act
        let start = Instant::now();
        let a = tokio::spawn({
            let t = Arc::clone(&throttle);
            async move { t.acquire().await }
        });
        let b = tokio::spawn({
            let t = Arc::clone(&throttle);
            async move { t.acquire().await }
        });
        let _ = tokio::join!(a, b);
        throttle.acquire().await;

        // Assert
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_default_interval() {
        // Arrange & Act
        let throttle = RequestThrottle::default_interval();

        // Assert
        assert_eq!(throttle.min_interval, Duration::from_millis(25));
    }
}
