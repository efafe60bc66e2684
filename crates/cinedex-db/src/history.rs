//! Recently browsed titles.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::media::MediaKind;

/// One visit to a title's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Movie or TV series.
    pub kind: MediaKind,
    /// TMDB ID.
    pub id: u64,
    /// Title at the time of the visit.
    pub title: String,
    /// When the title was last visited.
    pub visited_at: DateTime<Utc>,
}

/// Records a visit and trims the history to the `limit` newest entries.
///
/// Visiting a title again moves it to the front.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn record_visit(conn: &Connection, visit: &Visit, limit: usize) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    tx.execute(
        "INSERT INTO recently_browsed (kind, id, title, visited_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(kind, id) DO UPDATE SET
            title = excluded.title,
            visited_at = excluded.visited_at",
        rusqlite::params![
            visit.kind.as_str(),
            visit.id,
            visit.title,
            visit.visited_at.timestamp_millis(),
        ],
    )
    .with_context(|| format!("failed to record visit to {} {}", visit.kind, visit.id))?;

    let trimmed = tx
        .execute(
            "DELETE FROM recently_browsed WHERE rowid NOT IN (
                SELECT rowid FROM recently_browsed ORDER BY visited_at DESC LIMIT ?1
            )",
            [limit],
        )
        .context("failed to trim history")?;
    if trimmed > 0 {
        tracing::debug!(trimmed, limit, "history trimmed");
    }

    tx.commit().context("failed to commit visit")?;
    Ok(())
}

/// Lists at most `limit` visits, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<Visit>> {
    let mut stmt = conn
        .prepare(
            "SELECT kind, id, title, visited_at
             FROM recently_browsed
             ORDER BY visited_at DESC
             LIMIT ?1",
        )
        .context("failed to prepare history query")?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .context("failed to query history")?;

    let mut visits = Vec::new();
    for row in rows {
        let (kind, id, title, visited_at) = row.context("failed to read history row")?;
        visits.push(Visit {
            kind: kind.parse()?,
            id,
            title,
            visited_at: DateTime::from_timestamp_millis(visited_at)
                .with_context(|| format!("invalid visited_at for {kind} {id}"))?,
        });
    }
    Ok(visits)
}
