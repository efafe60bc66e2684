//! Cache-backed and uncached paging helpers shared by the browse commands.

use std::sync::Arc;

use anyhow::{Result, bail};
use cinedex_paging::{
    LoadResult, LocalCache, MediatorConfig, MediatorResult, NetworkFetcher, NetworkPageSource,
    Pager, RemoteMediator, Scope,
};
use tracing::instrument;

use crate::config::CacheConfig;

/// Builds a pager for `scope` whose TTL comes from the cache config.
pub fn cached_pager<F, C>(scope: Scope, fetcher: F, cache: C, config: &CacheConfig) -> Pager<F, C>
where
    F: NetworkFetcher,
    F::Item: Send,
    C: LocalCache + 'static,
    C::Row: From<F::Item>,
{
    let ttl = config.ttl_for(scope.collection());
    let mediator =
        RemoteMediator::new(scope, fetcher, Arc::new(cache)).with_config(MediatorConfig { ttl });
    Pager::new(mediator)
}

fn ensure_loaded(result: &MediatorResult, scope: &Scope) -> Result<()> {
    if let Some(err) = result.error() {
        bail!("failed to load {scope}: {err}");
    }
    Ok(())
}

/// Starts (or force-refreshes) the pager, loads until `pages` pages have been
/// requested and returns every cached row of the scope.
///
/// The first page counts even when a fresh cache made the refresh
/// unnecessary. Stops early at the end of pagination.
///
/// # Errors
///
/// Returns an error if any load fails or the cache cannot be read.
#[instrument(skip_all, fields(scope = %pager.mediator().scope(), pages = pages, force_refresh = force_refresh))]
pub async fn page_through<F, C>(
    pager: &Pager<F, C>,
    pages: u32,
    force_refresh: bool,
) -> Result<Vec<C::Row>>
where
    F: NetworkFetcher,
    F::Item: Send,
    C: LocalCache + 'static,
    C::Row: From<F::Item>,
{
    let scope = pager.mediator().scope();

    let initial = if force_refresh {
        Some(pager.refresh().await)
    } else {
        pager.start().await
    };
    match initial {
        Some(result) => {
            ensure_loaded(&result, scope)?;
            if result.is_end_of_pagination() {
                return Ok(pager.snapshot().await?);
            }
        }
        None => tracing::debug!("cache is fresh, skipped refresh"),
    }

    for _ in 1..pages {
        let result = pager.append().await;
        ensure_loaded(&result, scope)?;
        if result.is_end_of_pagination() {
            tracing::debug!("reached the last page");
            break;
        }
    }

    Ok(pager.snapshot().await?)
}

/// Loads up to `pages` pages straight from the network.
///
/// # Errors
///
/// Returns an error if a page fails to load.
pub async fn fetch_uncached<F: NetworkFetcher>(
    source: &NetworkPageSource<F>,
    pages: u32,
) -> Result<Vec<F::Item>> {
    let mut items = Vec::new();
    let mut key = None;
    for _ in 0..pages.max(1) {
        match source.load(key).await {
            LoadResult::Page { data, next_key, .. } => {
                items.extend(data);
                match next_key {
                    Some(next) => key = Some(next),
                    None => break,
                }
            }
            LoadResult::Error(err) => bail!("failed to load page {}: {err}", key.unwrap_or(1)),
        }
    }
    Ok(items)
}
