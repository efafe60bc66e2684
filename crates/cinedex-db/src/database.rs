//! Shared database handle.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use cinedex_paging::CacheError;
use rusqlite::Connection;
use tokio::sync::broadcast;

use super::connection::{open_db, open_in_memory};

/// Capacity of the change notification channel.
const CHANGES_CAPACITY: usize = 64;

/// One connection shared by every cache and user list.
///
/// Calls run on the blocking pool one at a time; a running transaction holds
/// the connection, so readers never observe it half-applied.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<String>,
}

impl Database {
    /// Opens `{dir}/cinedex.db` (or the default location) and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        open_db(dir).map(Self::from_connection)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        open_in_memory().map(Self::from_connection)
    }

    /// Wraps an already migrated connection.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        }
    }

    /// Runs `f` with exclusive access to the connection on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or an error if the connection lock is
    /// poisoned or the blocking task panics.
    pub async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| anyhow!("database connection lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .context("database task failed")?
    }

    /// Like [`Self::call`], with the cache error taxonomy.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &broadcast::Sender<String>) -> Result<T, CacheError>
            + Send
            + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let changes = self.changes.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| CacheError::Poisoned)?;
            f(&mut guard, &changes)
        })
        .await
        .map_err(|e| CacheError::storage("cache task failed", e))?
    }

    /// Subscribes to the scope keys of committed cache transactions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
