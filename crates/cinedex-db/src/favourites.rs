//! Favourite titles CRUD operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::media::MediaKind;

/// A title the user liked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favourite {
    /// Movie or TV series.
    pub kind: MediaKind,
    /// TMDB ID.
    pub id: u64,
    /// Title at the time it was liked.
    pub title: String,
    /// Poster image path (nullable).
    pub poster_path: Option<String>,
    /// When the title was liked.
    pub added_at: DateTime<Utc>,
}

/// Adds or refreshes a favourite.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn like(conn: &Connection, favourite: &Favourite) -> Result<()> {
    conn.execute(
        "INSERT INTO favourites (kind, id, title, poster_path, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(kind, id) DO UPDATE SET
            title = excluded.title,
            poster_path = excluded.poster_path",
        rusqlite::params![
            favourite.kind.as_str(),
            favourite.id,
            favourite.title,
            favourite.poster_path,
            favourite.added_at.timestamp_millis(),
        ],
    )
    .with_context(|| format!("failed to like {} {}", favourite.kind, favourite.id))?;
    Ok(())
}

/// Removes a favourite. Returns `true` if it existed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn unlike(conn: &Connection, kind: MediaKind, id: u64) -> Result<bool> {
    let removed = conn
        .execute(
            "DELETE FROM favourites WHERE kind = ?1 AND id = ?2",
            rusqlite::params![kind.as_str(), id],
        )
        .with_context(|| format!("failed to unlike {kind} {id}"))?;
    Ok(removed > 0)
}

/// Returns `true` if the title is a favourite.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn is_favourite(conn: &Connection, kind: MediaKind, id: u64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM favourites WHERE kind = ?1 AND id = ?2",
            rusqlite::params![kind.as_str(), id],
            |_| Ok(()),
        )
        .optional()
        .with_context(|| format!("failed to look up favourite {kind} {id}"))?;
    Ok(found.is_some())
}

/// Lists favourites, most recently liked first, optionally of one kind.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_favourites(conn: &Connection, kind: Option<MediaKind>) -> Result<Vec<Favourite>> {
    let mut stmt = conn
        .prepare(
            "SELECT kind, id, title, poster_path, added_at
             FROM favourites
             WHERE ?1 IS NULL OR kind = ?1
             ORDER BY added_at DESC, id",
        )
        .context("failed to prepare favourites query")?;

    let rows = stmt
        .query_map([kind.map(MediaKind::as_str)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .context("failed to query favourites")?;

    let mut favourites = Vec::new();
    for row in rows {
        let (kind, id, title, poster_path, added_at) =
            row.context("failed to read favourite row")?;
        favourites.push(Favourite {
            kind: kind.parse()?,
            id,
            title,
            poster_path,
            added_at: DateTime::from_timestamp_millis(added_at)
                .with_context(|| format!("invalid added_at for {kind} {id}"))?,
        });
    }
    Ok(favourites)
}
