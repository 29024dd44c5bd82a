use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::models::{Event, Outcome};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,
    outcome    INTEGER NOT NULL,
    timestamp  INTEGER NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("wheelstat.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    debug!(path = %path.display(), "opened history store");
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

pub fn insert_event(conn: &Connection, event: &Event) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO events (id, outcome, timestamp) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.id, event.outcome.value(), event.timestamp],
    ).context("Insert failed")?;
    Ok(changed > 0)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        outcome: Outcome(row.get::<_, u8>(1)?),
        timestamp: row.get(2)?,
    })
}

/// Whole history, oldest first.
pub fn fetch_history(conn: &Connection) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, outcome, timestamp FROM events ORDER BY seq ASC"
    )?;
    let events = stmt.query_map([], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// The last `limit` events, oldest first.
pub fn fetch_last_events(conn: &Connection, limit: u32) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, outcome, timestamp FROM (
             SELECT seq, id, outcome, timestamp FROM events ORDER BY seq DESC LIMIT ?1
         ) ORDER BY seq ASC"
    )?;
    let events = stmt.query_map([limit], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

pub fn count_events(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(count)
}

pub fn delete_last_event(conn: &Connection) -> Result<Option<Event>> {
    let last = conn.query_row(
        "SELECT id, outcome, timestamp FROM events ORDER BY seq DESC LIMIT 1",
        [],
        row_to_event,
    ).optional()?;

    if let Some(event) = &last {
        conn.execute("DELETE FROM events WHERE id = ?1", [&event.id])
            .context("Delete failed")?;
        debug!(id = %event.id, outcome = %event.outcome, "removed last event");
    }
    Ok(last)
}

pub fn clear_history(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM events", [])
        .context("Clear failed")?;
    Ok(removed)
}

/// Appends `events` in order, all or nothing. Returns how many were new.
pub fn insert_events(conn: &Connection, events: &[Event]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;

    let mut inserted = 0;
    for event in events {
        if insert_event(&tx, event)? {
            inserted += 1;
        }
    }

    tx.commit().context("Commit failed")?;
    Ok(inserted)
}

/// Swaps the stored history for `events` in a single transaction.
pub fn replace_history(conn: &Connection, events: &[Event]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;

    tx.execute("DELETE FROM events", [])
        .context("Clear failed")?;
    let mut inserted = 0;
    for event in events {
        if insert_event(&tx, event)? {
            inserted += 1;
        }
    }

    tx.commit().context("Commit failed")?;
    debug!(inserted, "history replaced");
    Ok(inserted)
}
