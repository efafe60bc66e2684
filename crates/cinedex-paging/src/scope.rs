//! Collection scopes and their persisted remote keys.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use url::form_urlencoded;

/// Identity of one cached, paginated collection.
///
/// A collection kind (e.g. `movies/top_rated`) plus every dimension value
/// (language, region, sort/filter parameters) that makes its rows distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    /// Collection kind.
    collection: String,
    /// Dimension name to value, ordered for a stable key.
    dimensions: BTreeMap<String, String>,
}

impl Scope {
    /// Creates a scope with no dimensions.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            dimensions: BTreeMap::new(),
        }
    }

    /// Adds a dimension.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    /// Adds a dimension when `value` is present.
    #[must_use]
    pub fn with_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    /// Collection kind.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Value of a dimension.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }

    /// Stable persisted identifier, `collection?k=v&k=v`.
    ///
    /// Names and values are form-urlencoded, so distinct dimension sets never
    /// share a key.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)?;
        let mut separator = '?';
        for (name, value) in &self.dimensions {
            let name: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
            let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
            write!(f, "{separator}{name}={value}")?;
            separator = '&';
        }
        Ok(())
    }
}

/// Pagination bookkeeping for one scope.
///
/// Replaced on every refresh, updated on every append, deleted when the
/// scope's cache is invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteKey {
    /// Persisted scope identifier (see [`Scope::key`]).
    pub scope: String,
    /// Next page to fetch. `None` means the end of pagination was reached.
    pub next_page: Option<u32>,
    /// When the scope was last written from the network.
    pub last_updated: DateTime<Utc>,
}

impl RemoteKey {
    /// Creates a key for `scope`.
    #[must_use]
    pub fn new(scope: &Scope, next_page: Option<u32>, last_updated: DateTime<Utc>) -> Self {
        Self {
            scope: scope.key(),
            next_page,
            last_updated,
        }
    }

    /// Returns `true` once there are no further pages.
    #[must_use]
    pub const fn is_end_of_pagination(&self) -> bool {
        self.next_page.is_none()
    }

    /// Time elapsed since `last_updated`. Negative if the clock moved backwards.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.last_updated)
    }

    /// Returns `true` when `age >= ttl`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        TimeDelta::from_std(ttl).is_ok_and(|ttl| self.age(now) >= ttl)
    }
}
