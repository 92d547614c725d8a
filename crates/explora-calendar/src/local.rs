//! SQLite-backed calendar used on desktop in place of the platform calendar.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::destination::parse_travel_date;
use crate::error::CalendarError;
use crate::native::{NativeCalendar, NewEvent};

/// Event stored in the local calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEvent {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub notes: String,
    pub alarm_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Local calendar. Cloning shares the same connection.
#[derive(Clone)]
pub struct LocalCalendar {
    conn: Arc<Mutex<Connection>>,
}

impl LocalCalendar {
    /// Open or create the calendar at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CalendarError::Native(format!("{}: {}", parent.display(), e)))?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory calendar.
    pub fn in_memory() -> Result<Self, CalendarError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CalendarError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                location TEXT NOT NULL,
                notes TEXT NOT NULL,
                alarm_minutes INTEGER,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_date);
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Store an event, or return `None` if its dates are unusable.
    pub fn insert(&self, event: &NewEvent) -> Result<Option<String>, CalendarError> {
        let (Some(start), Some(end)) = (
            parse_travel_date(&event.start_date),
            parse_travel_date(&event.end_date),
        ) else {
            tracing::warn!(
                "Rejecting event {:?}: unparseable dates {} / {}",
                event.title,
                event.start_date,
                event.end_date
            );
            return Ok(None);
        };

        if end < start {
            tracing::warn!("Rejecting event {:?}: ends before it starts", event.title);
            return Ok(None);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.conn.lock().execute(
            r#"
            INSERT INTO events
            (id, title, start_date, end_date, location, notes, alarm_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                id,
                event.title,
                start.to_string(),
                end.to_string(),
                event.location,
                event.notes,
                event.reminder_minutes_before,
                Utc::now().timestamp_millis(),
            ],
        )?;

        tracing::debug!("Created local event {} ({})", id, event.title);
        Ok(Some(id))
    }

    /// Delete an event, returning whether it existed.
    pub fn remove(&self, event_id: &str) -> Result<bool, CalendarError> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM events WHERE id = ?1", params![event_id])?;
        Ok(removed > 0)
    }

    pub fn get_event(&self, event_id: &str) -> Result<Option<LocalEvent>, CalendarError> {
        let conn = self.conn.lock();
        let event = conn
            .query_row(
                "SELECT id, title, start_date, end_date, location, notes, alarm_minutes, created_at FROM events WHERE id = ?1",
                params![event_id],
                Self::row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    /// All events ordered by start date.
    pub fn list_events(&self) -> Result<Vec<LocalEvent>, CalendarError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, start_date, end_date, location, notes, alarm_minutes, created_at FROM events ORDER BY start_date ASC, created_at ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_event)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<LocalEvent> {
        let date_column = |idx: usize| -> rusqlite::Result<NaiveDate> {
            let raw: String = row.get(idx)?;
            parse_travel_date(&raw).ok_or_else(|| undecodable(idx, Type::Text, &raw))
        };
        let created_ms: i64 = row.get(7)?;

        Ok(LocalEvent {
            id: row.get(0)?,
            title: row.get(1)?,
            start_date: date_column(2)?,
            end_date: date_column(3)?,
            location: row.get(4)?,
            notes: row.get(5)?,
            alarm_minutes: row.get(6)?,
            created_at: DateTime::from_timestamp_millis(created_ms)
                .ok_or_else(|| undecodable(7, Type::Integer, &created_ms))?,
        })
    }
}

fn undecodable(idx: usize, ty: Type, value: &dyn std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, format!("unreadable value {}", value).into())
}

#[async_trait]
impl NativeCalendar for LocalCalendar {
    async fn create_event(&self, event: &NewEvent) -> Result<Option<String>, CalendarError> {
        let calendar = self.clone();
        let event = event.clone();
        tokio::task::spawn_blocking(move || calendar.insert(&event))
            .await
            .map_err(|e| CalendarError::Native(e.to_string()))?
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, CalendarError> {
        let calendar = self.clone();
        let event_id = event_id.to_string();
        tokio::task::spawn_blocking(move || calendar.remove(&event_id))
            .await
            .map_err(|e| CalendarError::Native(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use explora_core::DatabaseError;

    fn trip(start: &str, end: &str) -> NewEvent {
        NewEvent {
            title: "Travel to Kyoto".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            location: "Kyoto (35.0116°N, 135.7681°E)".to_string(),
            notes: "Temples and tea houses".to_string(),
            reminder_minutes_before: Some(1440),
        }
    }

    #[test]
    fn test_insert_and_get_event() {
        let calendar = LocalCalendar::in_memory().unwrap();
        let id = calendar.insert(&trip("2025-04-01", "2025-04-10")).unwrap().unwrap();

        let event = calendar.get_event(&id).unwrap().unwrap();
        assert_eq!(event.title, "Travel to Kyoto");
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(event.alarm_minutes, Some(1440));
    }

    #[test]
    fn test_invalid_dates_are_refused() {
        let calendar = LocalCalendar::in_memory().unwrap();
        assert_eq!(calendar.insert(&trip("soon", "2025-04-10")).unwrap(), None);
        assert_eq!(calendar.insert(&trip("2025-04-10", "2025-04-01")).unwrap(), None);
        assert!(calendar.list_events().unwrap().is_empty());
    }

    #[test]
    fn test_remove_reports_existence() {
        let calendar = LocalCalendar::in_memory().unwrap();
        let id = calendar.insert(&trip("2025-04-01", "2025-04-10")).unwrap().unwrap();

        assert!(calendar.remove(&id).unwrap());
        assert!(!calendar.remove(&id).unwrap());
    }

    #[test]
    fn test_list_events_ordered_by_start() {
        let calendar = LocalCalendar::in_memory().unwrap();
        calendar.insert(&trip("2025-06-01", "2025-06-07")).unwrap();
        calendar.insert(&trip("2025-04-01", "2025-04-10")).unwrap();

        let events = calendar.list_events().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].start_date < events[1].start_date);
    }

    #[test]
    fn test_unreadable_stored_date_is_corruption() {
        let calendar = LocalCalendar::in_memory().unwrap();
        let id = calendar.insert(&trip("2025-04-01", "2025-04-10")).unwrap().unwrap();
        calendar
            .conn
            .lock()
            .execute("UPDATE events SET end_date = 'someday' WHERE id = ?1", params![id])
            .unwrap();

        assert!(matches!(
            calendar.get_event(&id),
            Err(CalendarError::Store(DatabaseError::Corruption(_)))
        ));
        assert!(calendar.list_events().is_err());
    }

    #[tokio::test]
    async fn test_native_calendar_impl() {
        let calendar = LocalCalendar::in_memory().unwrap();
        let id = calendar
            .create_event(&trip("2025-04-01", "2025-04-10"))
            .await
            .unwrap()
            .unwrap();

        assert!(calendar.delete_event(&id).await.unwrap());
        assert!(!calendar.delete_event(&id).await.unwrap());
    }
}
