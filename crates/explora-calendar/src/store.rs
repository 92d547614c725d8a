//! SQLite-backed mapping from destination key to calendar event id.
//!
//! One row per destination; a missing row means no reminder is linked.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::CalendarError;

/// A persisted destination -> event link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarLink {
    pub destination_key: String,
    pub event_id: String,
    pub linked_at: DateTime<Utc>,
}

/// Durable link store. Every write is a single statement.
pub struct LinkStore {
    conn: Mutex<Connection>,
}

impl LinkStore {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CalendarError::Store(explora_core::DatabaseError::ConnectionFailed(format!(
                        "{}: {}",
                        parent.display(),
                        e
                    )))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create a store that lives only as long as this value.
    pub fn in_memory() -> Result<Self, CalendarError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CalendarError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS calendar_links (
                destination_key TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                linked_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_calendar_links_event ON calendar_links(event_id);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Event id linked to a destination, if any.
    pub fn get(&self, destination_key: &str) -> Result<Option<String>, CalendarError> {
        let conn = self.conn.lock();
        let event_id = conn
            .query_row(
                "SELECT event_id FROM calendar_links WHERE destination_key = ?1",
                params![destination_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(event_id)
    }

    /// Link a destination to an event. An existing link is never replaced;
    /// returns `false` if the destination was already linked.
    pub fn link(&self, destination_key: &str, event_id: &str) -> Result<bool, CalendarError> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO calendar_links (destination_key, event_id, linked_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(destination_key) DO NOTHING",
            params![destination_key, event_id, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Drop the link for a destination. Returns whether one existed.
    pub fn remove(&self, destination_key: &str) -> Result<bool, CalendarError> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM calendar_links WHERE destination_key = ?1",
            params![destination_key],
        )?;
        Ok(removed > 0)
    }

    /// Drop whichever destination points at `event_id`, returning its key.
    pub fn remove_by_event_id(&self, event_id: &str) -> Result<Option<String>, CalendarError> {
        let conn = self.conn.lock();
        let key: Option<String> = conn
            .query_row(
                "DELETE FROM calendar_links WHERE event_id = ?1 RETURNING destination_key",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key)
    }

    /// All links, ordered by destination key.
    pub fn list(&self) -> Result<Vec<CalendarLink>, CalendarError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT destination_key, event_id, linked_at FROM calendar_links ORDER BY destination_key",
        )?;

        let rows = stmt.query_map([], |row| {
            let linked_at: String = row.get(2)?;
            let linked_at = DateTime::parse_from_rfc3339(&linked_at)
                .map_err(|e| FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
            Ok(CalendarLink {
                destination_key: row.get(0)?,
                event_id: row.get(1)?,
                linked_at: linked_at.with_timezone(&Utc),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
