//! `NetworkPageSource` - uncached paging straight from the network.
//!
//! Used for secondary lists (search results, similar titles) where staleness
//! and offline access do not matter.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::error::FetchError;
use crate::fetcher::NetworkFetcher;
use crate::page::prev_key;

/// Result of one page-source load.
#[derive(Debug)]
pub enum LoadResult<T> {
    /// A loaded page and the keys of its neighbours.
    Page {
        /// Exposed items, after filtering.
        data: Vec<T>,
        /// Key of the previous page, `None` on the first page.
        prev_key: Option<u32>,
        /// Key of the next page, `None` on the last page.
        next_key: Option<u32>,
    },
    /// The fetch failed. Retrying is left to the consumer.
    Error(FetchError),
}

/// Keys of the loaded page closest to the consumer's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageAnchor {
    /// Previous key of that page.
    pub prev_key: Option<u32>,
    /// Next key of that page.
    pub next_key: Option<u32>,
}

/// Post-fetch predicate deciding which items are exposed.
pub type ItemFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Stateless page source over a [`NetworkFetcher`].
pub struct NetworkPageSource<F: NetworkFetcher> {
    fetcher: F,
    filter: Option<ItemFilter<F::Item>>,
}

impl<F: NetworkFetcher + fmt::Debug> fmt::Debug for NetworkPageSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkPageSource")
            .field("fetcher", &self.fetcher)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl<F: NetworkFetcher> NetworkPageSource<F> {
    /// Creates a source exposing every fetched item.
    pub const fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            filter: None,
        }
    }

    /// Exposes only items accepted by `keep`.
    ///
    /// Filtering happens after the page keys are computed, so it never
    /// changes pagination.
    #[must_use]
    pub fn with_filter(mut self, keep: impl Fn(&F::Item) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(keep));
        self
    }

    /// Loads the page at `requested_key`, or the first page when absent.
    #[instrument(skip_all, fields(key = ?requested_key))]
    pub async fn load(&self, requested_key: Option<u32>) -> LoadResult<F::Item> {
        let requested = requested_key.unwrap_or(1);

        match self.fetcher.fetch(requested).await {
            Ok(page) => {
                let prev_key = prev_key(requested);
                let next_key = page.next_key();
                let page = match &self.filter {
                    Some(keep) => page.retain(|item| keep(item)),
                    None => page,
                };
                tracing::debug!(items = page.items.len(), ?prev_key, ?next_key, "page loaded");
                LoadResult::Page {
                    data: page.items,
                    prev_key,
                    next_key,
                }
            }
            Err(err) => {
                tracing::warn!(page = requested, error = %err, "page load failed");
                LoadResult::Error(err)
            }
        }
    }

    /// Key to resume from after an invalidation.
    ///
    /// `anchor` is the loaded page closest to the consumer's position, or
    /// `None` when nothing is visible.
    #[must_use]
    pub fn refresh_key(&self, anchor: Option<PageAnchor>) -> Option<u32> {
        anchor.and_then(|a| refresh_anchor_key(a.prev_key, a.next_key))
    }
}

/// Prefers `prev + 1`, then `next - 1`, then `None` (reload from the start).
///
/// Resuming slightly behind the last position wins over skipping ahead.
#[must_use]
pub fn refresh_anchor_key(prior_prev_key: Option<u32>, prior_next_key: Option<u32>) -> Option<u32> {
    prior_prev_key
        .and_then(|k| k.checked_add(1))
        .or_else(|| prior_next_key.and_then(|k| k.checked_sub(1)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::error::FetchErrorKind;
    use crate::mediator::tests::{Movie, ScriptedFetcher};

    #[tokio::test]
    async fn test_first_page_has_no_prev_key() {
        // Arrange
        let source = NetworkPageSource::new(ScriptedFetcher::new(3, 4));

        // Act
        let result = source.load(None).await;

        // Assert
        match result {
            LoadResult::Page {
                data,
                prev_key,
                next_key,
            } => {
                assert_eq!(data, vec![Movie(0), Movie(1), Movie(2)]);
                assert_eq!(prev_key, None);
                assert_eq!(next_key, Some(2));
            }
            LoadResult::Error(err) => panic!("unexpected error: {err}"),
        }
    }

    #[tokio::test]
    async fn test_last_page_has_no_next_key() {
        // Arrange
        let source = NetworkPageSource::new(ScriptedFetcher::new(3, 4));

        // Act
        let result = source.load(Some(4)).await;

        // Assert
        assert!(matches!(
            result,
            LoadResult::Page {
                prev_key: Some(3),
                next_key: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_filter_does_not_change_keys() {
        // Arrange
        let source =
            NetworkPageSource::new(ScriptedFetcher::new(4, 3)).with_filter(|m: &Movie| m.0 % 2 == 1);

        // Act
        let result = source.load(Some(2)).await;

        // Assert
        match result {
            LoadResult::Page {
                data,
                prev_key,
                next_key,
            } => {
                assert_eq!(data, vec![Movie(5), Movie(7)]);
                assert_eq!(prev_key, Some(1));
                assert_eq!(next_key, Some(3));
            }
            LoadResult::Error(err) => panic!("unexpected error: {err}"),
        }
    }

    #[tokio::test]
    async fn test_filter_rejecting_everything_keeps_paginating() {
        // Arrange
        let source = NetworkPageSource::new(ScriptedFetcher::new(4, 3)).with_filter(|_: &Movie| false);

        // Act
        let result = source.load(Some(1)).await;

        // Assert
        assert!(matches!(
            result,
            LoadResult::Page { ref data, next_key: Some(2), .. } if data.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_returned_without_retry() {
        // Arrange
        let fetcher = ScriptedFetcher::new(4, 3);
        fetcher.fail_next(FetchError::network("GET", "connection refused"));
        let source = NetworkPageSource::new(fetcher);

        // Act
        let result = source.load(None).await;

        // Assert
        match result {
            LoadResult::Error(err) => assert_eq!(err.kind(), FetchErrorKind::Network),
            LoadResult::Page { .. } => panic!("expected an error"),
        }
        assert_eq!(source.fetcher.calls(), vec![1]);
    }

    #[test]
    fn test_refresh_anchor_key_preference() {
        // Arrange & Act & Assert
        assert_eq!(refresh_anchor_key(Some(3), Some(5)), Some(4));
        assert_eq!(refresh_anchor_key(None, Some(2)), Some(1));
        assert_eq!(refresh_anchor_key(None, None), None);
    }

    #[test]
    fn test_refresh_key_without_anchor_restarts() {
        // Arrange
        let source = NetworkPageSource::new(ScriptedFetcher::new(1, 1));

        // Act & Assert
        assert_eq!(source.refresh_key(None), None);
        assert_eq!(
            source.refresh_key(Some(PageAnchor {
                prev_key: Some(1),
                next_key: Some(3),
            })),
            Some(2)
        );
    }
}
