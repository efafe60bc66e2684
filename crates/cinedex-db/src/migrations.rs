//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: paged list tables and `remote_keys`.
///
/// `position` is the rowid, so rows of a scope read back in insertion order.
/// A duplicate `(scope, id)` replaces the earlier row and moves it to the end.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS movies (
            position        INTEGER PRIMARY KEY,
            scope           TEXT NOT NULL,
            id              INTEGER NOT NULL,
            title           TEXT NOT NULL,
            original_title  TEXT,
            overview        TEXT,
            release_date    TEXT,
            poster_path     TEXT,
            backdrop_path   TEXT,
            popularity      REAL NOT NULL DEFAULT 0,
            vote_average    REAL NOT NULL DEFAULT 0,
            vote_count      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (scope, id) ON CONFLICT REPLACE
        );

        CREATE TABLE IF NOT EXISTS now_playing_movies (
            position        INTEGER PRIMARY KEY,
            scope           TEXT NOT NULL,
            id              INTEGER NOT NULL,
            title           TEXT NOT NULL,
            original_title  TEXT,
            overview        TEXT,
            release_date    TEXT,
            poster_path     TEXT,
            backdrop_path   TEXT,
            popularity      REAL NOT NULL DEFAULT 0,
            vote_average    REAL NOT NULL DEFAULT 0,
            vote_count      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (scope, id) ON CONFLICT REPLACE
        );

        CREATE TABLE IF NOT EXISTS tv_shows (
            position        INTEGER PRIMARY KEY,
            scope           TEXT NOT NULL,
            id              INTEGER NOT NULL,
            name            TEXT NOT NULL,
            original_name   TEXT,
            overview        TEXT,
            first_air_date  TEXT,
            poster_path     TEXT,
            backdrop_path   TEXT,
            popularity      REAL NOT NULL DEFAULT 0,
            vote_average    REAL NOT NULL DEFAULT 0,
            vote_count      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (scope, id) ON CONFLICT REPLACE
        );

        CREATE TABLE IF NOT EXISTS on_the_air_tv_shows (
            position        INTEGER PRIMARY KEY,
            scope           TEXT NOT NULL,
            id              INTEGER NOT NULL,
            name            TEXT NOT NULL,
            original_name   TEXT,
            overview        TEXT,
            first_air_date  TEXT,
            poster_path     TEXT,
            backdrop_path   TEXT,
            popularity      REAL NOT NULL DEFAULT 0,
            vote_average    REAL NOT NULL DEFAULT 0,
            vote_count      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (scope, id) ON CONFLICT REPLACE
        );

        CREATE TABLE IF NOT EXISTS remote_keys (
            scope         TEXT PRIMARY KEY,
            next_page     INTEGER,
            last_updated  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_movies_scope ON movies(scope, position);
        CREATE INDEX IF NOT EXISTS idx_tv_shows_scope ON tv_shows(scope, position);",
    )
    .context("failed to create cache tables")?;

    Ok(())
}

/// Migration to v2: `favourites` and `recently_browsed`.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS favourites (
            kind         TEXT NOT NULL,
            id           INTEGER NOT NULL,
            title        TEXT NOT NULL,
            poster_path  TEXT,
            added_at     INTEGER NOT NULL,
            PRIMARY KEY (kind, id)
        );

        CREATE TABLE IF NOT EXISTS recently_browsed (
            kind        TEXT NOT NULL,
            id          INTEGER NOT NULL,
            title       TEXT NOT NULL,
            visited_at  INTEGER NOT NULL,
            PRIMARY KEY (kind, id)
        );

        CREATE INDEX IF NOT EXISTS idx_recently_browsed_visited_at
            ON recently_browsed(visited_at);",
    )
    .context("failed to create user tables")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_tables_exist_after_migration() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tables,
            vec![
                "favourites",
                "movies",
                "now_playing_movies",
                "on_the_air_tv_shows",
                "recently_browsed",
                "remote_keys",
                "tv_shows",
            ]
        );
    }

    #[test]
    fn test_v1_database_upgrades_to_v2() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM favourites", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_duplicate_scope_id_replaces_row() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        // Act
        conn.execute_batch(
            "INSERT INTO movies (scope, id, title) VALUES ('s', 1, 'old');
             INSERT INTO movies (scope, id, title) VALUES ('s', 2, 'other');
             INSERT INTO movies (scope, id, title) VALUES ('s', 1, 'new');",
        )
        .unwrap();

        // Assert
        let mut stmt = conn
            .prepare("SELECT title FROM movies WHERE scope = 's' ORDER BY position")
            .unwrap();
        let titles: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(titles, vec!["other", "new"]);
    }
}
