//! In-process `LocalCache` for ephemeral lists and tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use tokio::sync::broadcast;

use crate::cache::{CacheTransaction, CachedRow, LocalCache};
use crate::error::CacheError;
use crate::scope::{RemoteKey, Scope};

/// Capacity of the change notification channel.
const CHANGES_CAPACITY: usize = 64;

/// Rows and keys of every scope.
#[derive(Debug, Clone)]
struct MemoryState<R> {
    rows: HashMap<String, Vec<R>>,
    keys: HashMap<String, RemoteKey>,
}

impl<R> Default for MemoryState<R> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            keys: HashMap::new(),
        }
    }
}

/// Cache held in memory.
///
/// A transaction runs against a copy of the state; the copy replaces the live
/// state only when the block succeeds. Writers are serialized, readers never
/// wait for a running block.
#[derive(Debug)]
pub struct MemoryCache<R> {
    state: RwLock<MemoryState<R>>,
    writer: Mutex<()>,
    changes: broadcast::Sender<String>,
}

impl<R: CachedRow> Default for MemoryCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CachedRow> MemoryCache<R> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            state: RwLock::new(MemoryState::default()),
            writer: Mutex::new(()),
            changes,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState<R>) -> T) -> Result<T, CacheError> {
        let state = self.state.read().map_err(|_| CacheError::Poisoned)?;
        Ok(f(&state))
    }

    fn run<T, B>(&self, block: B) -> Result<T, CacheError>
    where
        B: FnOnce(&mut dyn CacheTransaction<R>) -> Result<T, CacheError>,
    {
        let _writer = self.writer.lock().map_err(|_| CacheError::Poisoned)?;
        let draft = self.read(Clone::clone)?;
        let mut tx = MemoryTransaction {
            state: draft,
            touched: BTreeSet::new(),
        };

        let value = block(&mut tx)?;

        let MemoryTransaction { state, touched } = tx;
        *self.state.write().map_err(|_| CacheError::Poisoned)? = state;
        for scope in touched {
            // No receivers is fine.
            let _ = self.changes.send(scope);
        }
        Ok(value)
    }
}

impl<R: CachedRow> LocalCache for MemoryCache<R> {
    type Row = R;

    async fn read_remote_key(&self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
        let key = scope.key();
        self.read(|state| state.keys.get(&key).cloned())
    }

    async fn load_rows(&self, scope: &Scope) -> Result<Vec<R>, CacheError> {
        let key = scope.key();
        self.read(|state| state.rows.get(&key).cloned().unwrap_or_default())
    }

    async fn count_rows(&self, scope: &Scope) -> Result<usize, CacheError> {
        let key = scope.key();
        self.read(|state| state.rows.get(&key).map_or(0, Vec::len))
    }

    async fn transaction<T, B>(&self, block: B) -> Result<T, CacheError>
    where
        T: Send + 'static,
        B: FnOnce(&mut dyn CacheTransaction<R>) -> Result<T, CacheError> + Send + 'static,
    {
        self.run(block)
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

/// Draft state of a running transaction.
struct MemoryTransaction<R> {
    state: MemoryState<R>,
    touched: BTreeSet<String>,
}

impl<R: CachedRow> CacheTransaction<R> for MemoryTransaction<R> {
    fn read_remote_key(&mut self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
        Ok(self.state.keys.get(&scope.key()).cloned())
    }

    fn delete_rows(&mut self, scope: &Scope) -> Result<usize, CacheError> {
        let key = scope.key();
        let removed = self.state.rows.remove(&key).map_or(0, |rows| rows.len());
        self.touched.insert(key);
        Ok(removed)
    }

    fn delete_remote_key(&mut self, scope: &Scope) -> Result<(), CacheError> {
        let key = scope.key();
        self.state.keys.remove(&key);
        self.touched.insert(key);
        Ok(())
    }

    fn insert_rows(&mut self, scope: &Scope, rows: Vec<R>) -> Result<usize, CacheError> {
        let key = scope.key();
        let stored = self.state.rows.entry(key.clone()).or_default();
        let inserted = rows.len();
        for row in rows {
            let id = row.item_id();
            stored.retain(|existing| existing.item_id() != id);
            stored.push(row);
        }
        self.touched.insert(key);
        Ok(inserted)
    }

    fn upsert_remote_key(&mut self, key: &RemoteKey) -> Result<(), CacheError> {
        self.state.keys.insert(key.scope.clone(), key.clone());
        self.touched.insert(key.scope.clone());
        Ok(())
    }
}
