//! `LocalCache` contract: cached rows plus remote-key bookkeeping per scope.

use std::future::Future;

use tokio::sync::broadcast;

use crate::error::CacheError;
use crate::scope::{RemoteKey, Scope};

/// A persisted row for one catalog entry.
pub trait CachedRow: Clone + Send + Sync + 'static {
    /// Upstream identifier. Inserting a row whose id already exists in the
    /// scope replaces the earlier row.
    fn item_id(&self) -> u64;
}

/// Operations available inside one atomic cache transaction.
///
/// Returning an error from the transaction block rolls every operation back.
pub trait CacheTransaction<R> {
    /// Reads the remote key of `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store cannot be read.
    fn read_remote_key(&mut self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError>;

    /// Deletes every row of `scope`. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store rejects the delete.
    fn delete_rows(&mut self, scope: &Scope) -> Result<usize, CacheError>;

    /// Deletes the remote key of `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store rejects the delete.
    fn delete_remote_key(&mut self, scope: &Scope) -> Result<(), CacheError>;

    /// Appends rows to `scope` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store rejects an insert.
    fn insert_rows(&mut self, scope: &Scope, rows: Vec<R>) -> Result<usize, CacheError>;

    /// Inserts or replaces a remote key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the store rejects the write.
    fn upsert_remote_key(&mut self, key: &RemoteKey) -> Result<(), CacheError>;
}

/// Transactional store of cached rows and remote keys, grouped by scope.
///
/// Readers observe either the state before a transaction or the state after
/// it commits, never an intermediate one.
pub trait LocalCache: Send + Sync {
    /// Row type stored by this cache.
    type Row: CachedRow;

    /// Reads the remote key of `scope`.
    fn read_remote_key(
        &self,
        scope: &Scope,
    ) -> impl Future<Output = Result<Option<RemoteKey>, CacheError>> + Send;

    /// Loads all rows of `scope` in insertion order.
    fn load_rows(
        &self,
        scope: &Scope,
    ) -> impl Future<Output = Result<Vec<Self::Row>, CacheError>> + Send;

    /// Counts the rows of `scope`.
    fn count_rows(&self, scope: &Scope) -> impl Future<Output = Result<usize, CacheError>> + Send;

    /// Runs `block` atomically. Subscribers are notified of every scope the
    /// block touched once it commits.
    fn transaction<T, B>(&self, block: B) -> impl Future<Output = Result<T, CacheError>> + Send
    where
        T: Send + 'static,
        B: FnOnce(&mut dyn CacheTransaction<Self::Row>) -> Result<T, CacheError> + Send + 'static;

    /// Subscribes to committed scope keys.
    fn subscribe(&self) -> broadcast::Receiver<String>;

    /// Deletes the rows and the remote key of `scope` in one transaction.
    fn clear(&self, scope: &Scope) -> impl Future<Output = Result<(), CacheError>> + Send {
        let scope = scope.clone();
        self.transaction(move |tx| {
            tx.delete_rows(&scope)?;
            tx.delete_remote_key(&scope)
        })
    }
}
