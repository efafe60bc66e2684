//! Paged list cache: rows tagged by scope plus one remote key per scope.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cinedex_paging::{CacheError, CacheTransaction, LocalCache, RemoteKey, Scope};
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::broadcast;

use super::database::Database;
use super::rows::{CachedMovie, CachedTvShow, TableRow};

/// List tables, one per cached collection family.
const LIST_TABLES: [&str; 4] = ["movies", "now_playing_movies", "tv_shows", "on_the_air_tv_shows"];

/// `LocalCache` over one list table of the shared database.
#[derive(Debug)]
pub struct SqliteCache<R> {
    db: Database,
    table: &'static str,
    row: PhantomData<fn() -> R>,
}

impl<R> Clone for SqliteCache<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            table: self.table,
            row: PhantomData,
        }
    }
}

impl<R> SqliteCache<R> {
    const fn with_table(db: Database, table: &'static str) -> Self {
        Self {
            db,
            table,
            row: PhantomData,
        }
    }

    /// Name of the backing table.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }
}

impl SqliteCache<CachedMovie> {
    /// Cache of the scoped movie lists.
    #[must_use]
    pub const fn movies(db: Database) -> Self {
        Self::with_table(db, "movies")
    }

    /// Cache of the singleton now-playing list.
    #[must_use]
    pub const fn now_playing(db: Database) -> Self {
        Self::with_table(db, "now_playing_movies")
    }
}

impl SqliteCache<CachedTvShow> {
    /// Cache of the scoped TV lists.
    #[must_use]
    pub const fn tv_shows(db: Database) -> Self {
        Self::with_table(db, "tv_shows")
    }

    /// Cache of the singleton on-the-air list.
    #[must_use]
    pub const fn on_the_air(db: Database) -> Self {
        Self::with_table(db, "on_the_air_tv_shows")
    }
}

fn storage(context: &'static str) -> impl FnOnce(rusqlite::Error) -> CacheError {
    move |e| CacheError::storage(context, e)
}

fn read_key(conn: &Connection, scope: &str) -> Result<Option<RemoteKey>, CacheError> {
    conn.query_row(
        "SELECT scope, next_page, last_updated FROM remote_keys WHERE scope = ?1",
        [scope],
        remote_key_from_row,
    )
    .optional()
    .map_err(storage("failed to read remote key"))
}

fn remote_key_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RemoteKey> {
    let millis: i64 = row.get(2)?;
    let last_updated = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, millis))?;
    Ok(RemoteKey {
        scope: row.get(0)?,
        next_page: row.get(1)?,
        last_updated,
    })
}

impl<R: TableRow> LocalCache for SqliteCache<R> {
    type Row = R;

    async fn read_remote_key(&self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
        let key = scope.key();
        self.db.run(move |conn, _| read_key(conn, &key)).await
    }

    async fn load_rows(&self, scope: &Scope) -> Result<Vec<R>, CacheError> {
        let key = scope.key();
        let sql = format!(
            "SELECT {} FROM {} WHERE scope = ?1 ORDER BY position",
            R::COLUMNS,
            self.table
        );
        self.db
            .run(move |conn, _| {
                let mut stmt = conn
                    .prepare_cached(&sql)
                    .map_err(storage("failed to prepare rows query"))?;
                let rows = stmt
                    .query_map([&key], R::from_row)
                    .map_err(storage("failed to query rows"))?;
                rows.collect::<rusqlite::Result<Vec<R>>>()
                    .map_err(storage("failed to read row"))
            })
            .await
    }

    async fn count_rows(&self, scope: &Scope) -> Result<usize, CacheError> {
        let key = scope.key();
        let sql = format!("SELECT COUNT(*) FROM {} WHERE scope = ?1", self.table);
        self.db
            .run(move |conn, _| {
                conn.query_row(&sql, [&key], |row| row.get(0))
                    .map_err(storage("failed to count rows"))
            })
            .await
    }

    async fn transaction<T, B>(&self, block: B) -> Result<T, CacheError>
    where
        T: Send + 'static,
        B: FnOnce(&mut dyn CacheTransaction<R>) -> Result<T, CacheError> + Send + 'static,
    {
        let table = self.table;
        self.db
            .run(move |conn, changes| run_transaction::<R, T, B>(conn, changes, table, block))
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.db.subscribe()
    }
}

/// Runs `block` inside one `SQLite` transaction; dropping the transaction on
/// error rolls it back. Touched scopes are announced after the commit.
fn run_transaction<R, T, B>(
    conn: &mut Connection,
    changes: &broadcast::Sender<String>,
    table: &'static str,
    block: B,
) -> Result<T, CacheError>
where
    R: TableRow,
    B: FnOnce(&mut dyn CacheTransaction<R>) -> Result<T, CacheError>,
{
    let tx = conn
        .transaction()
        .map_err(storage("failed to begin transaction"))?;

    let mut sql_tx = SqliteTransaction::<R> {
        conn: &tx,
        table,
        touched: BTreeSet::new(),
        row: PhantomData,
    };
    let value = block(&mut sql_tx)?;
    let SqliteTransaction { touched, .. } = sql_tx;
    tracing::debug!(table, scopes = touched.len(), "committing cache transaction");

    tx.commit().map_err(storage("failed to commit transaction"))?;

    for scope in touched {
        tracing::trace!(scope, "cache scope committed");
        // No receivers is fine.
        let _ = changes.send(scope);
    }
    Ok(value)
}

/// Operations of one open transaction.
struct SqliteTransaction<'a, R> {
    conn: &'a Connection,
    table: &'static str,
    touched: BTreeSet<String>,
    row: PhantomData<fn() -> R>,
}

impl<R: TableRow> CacheTransaction<R> for SqliteTransaction<'_, R> {
    fn read_remote_key(&mut self, scope: &Scope) -> Result<Option<RemoteKey>, CacheError> {
        read_key(self.conn, &scope.key())
    }

    fn delete_rows(&mut self, scope: &Scope) -> Result<usize, CacheError> {
        let key = scope.key();
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE scope = ?1", self.table), [&key])
            .map_err(storage("failed to delete rows"))?;
        self.touched.insert(key);
        Ok(removed)
    }

    fn delete_remote_key(&mut self, scope: &Scope) -> Result<(), CacheError> {
        let key = scope.key();
        self.conn
            .execute("DELETE FROM remote_keys WHERE scope = ?1", [&key])
            .map_err(storage("failed to delete remote key"))?;
        self.touched.insert(key);
        Ok(())
    }

    fn insert_rows(&mut self, scope: &Scope, rows: Vec<R>) -> Result<usize, CacheError> {
        let key = scope.key();
        let sql = format!(
            "INSERT INTO {} (scope, {}) VALUES ({})",
            self.table,
            R::COLUMNS,
            R::PLACEHOLDERS
        );
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(storage("failed to prepare row insert"))?;

        let mut inserted: usize = 0;
        for row in &rows {
            let n = row
                .insert(&mut stmt, &key)
                .map_err(storage("failed to insert row"))?;
            inserted = inserted.saturating_add(n);
        }
        self.touched.insert(key);
        Ok(inserted)
    }

    fn upsert_remote_key(&mut self, key: &RemoteKey) -> Result<(), CacheError> {
        self.conn
            .execute(
                "INSERT INTO remote_keys (scope, next_page, last_updated) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope) DO UPDATE SET
                    next_page = excluded.next_page,
                    last_updated = excluded.last_updated",
                rusqlite::params![key.scope, key.next_page, key.last_updated.timestamp_millis()],
            )
            .map_err(storage("failed to upsert remote key"))?;
        self.touched.insert(key.scope.clone());
        Ok(())
    }
}

/// One cached scope as reported by `cache status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Remote key of the scope.
    pub key: RemoteKey,
    /// Rows cached for the scope across every list table.
    pub rows: usize,
}

/// Lists every remote key with its row count, most recently updated first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_remote_keys(conn: &Connection) -> Result<Vec<CacheEntry>> {
    let mut stmt = conn
        .prepare("SELECT scope, next_page, last_updated FROM remote_keys ORDER BY last_updated DESC")
        .context("failed to prepare remote keys query")?;
    let keys = stmt
        .query_map([], remote_key_from_row)
        .context("failed to query remote keys")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read remote key row")?;

    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let mut rows: usize = 0;
        for table in LIST_TABLES {
            let count: usize = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE scope = ?1"),
                    [&key.scope],
                    |row| row.get(0),
                )
                .with_context(|| format!("failed to count rows in {table}"))?;
            rows = rows.saturating_add(count);
        }
        entries.push(CacheEntry { key, rows });
    }
    Ok(entries)
}

/// Deletes every cached row and remote key. User tables are left alone.
///
/// Returns the number of rows removed from the list tables.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn clear_all(conn: &Connection) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    let mut removed: usize = 0;
    for table in LIST_TABLES {
        let n = tx
            .execute(&format!("DELETE FROM {table}"), [])
            .with_context(|| format!("failed to clear {table}"))?;
        removed = removed.saturating_add(n);
    }
    tx.execute("DELETE FROM remote_keys", [])
        .context("failed to clear remote keys")?;

    tx.commit().context("failed to commit cache clear")?;
    Ok(removed)
}
