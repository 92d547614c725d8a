//! Seam to the platform calendar that owns the actual events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Event to be created for a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    /// ISO-8601 date or timestamp.
    pub start_date: String,
    /// ISO-8601 date or timestamp.
    pub end_date: String,
    pub location: String,
    pub notes: String,
    /// Alarm offset before the start, in minutes. `None` means no alarm.
    pub reminder_minutes_before: Option<u32>,
}

/// Platform calendar capability.
///
/// `Ok(None)` / `Ok(false)` are the calendar's own refusals; `Err` is an
/// unexpected failure while talking to it.
#[async_trait]
pub trait NativeCalendar: Send + Sync {
    /// Create an event, returning its identifier on success.
    async fn create_event(&self, event: &NewEvent) -> Result<Option<String>, CalendarError>;

    /// Delete an event by identifier, returning whether it was removed.
    async fn delete_event(&self, event_id: &str) -> Result<bool, CalendarError>;
}
