//! `NetworkFetcher` trait definition.
#![allow(clippy::future_not_send)]

use crate::error::FetchError;
use crate::page::Page;

/// Stateless page fetch bound to one collection.
///
/// Each scope gets its own implementation carrying the dimensions it needs
/// (language, region, sort/filter parameters), so a mediator only ever asks
/// for a page number.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[trait_variant::make(NetworkFetcher: Send)]
pub trait LocalNetworkFetcher {
    /// Item type of the fetched pages.
    type Item;

    /// Fetches one page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`], [`FetchError::Protocol`] or
    /// [`FetchError::Decode`] depending on where the request failed.
    async fn fetch(&self, page: u32) -> Result<Page<Self::Item>, FetchError>;
}
