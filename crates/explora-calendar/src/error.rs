//! Calendar-specific error types.

use explora_core::{AppError, DatabaseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("Calendar backend error: {0}")]
    Native(String),

    #[error("A reminder update for {0} is already in progress")]
    InFlight(String),

    #[error("{0} is already linked to another calendar event")]
    LinkConflict(String),

    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl CalendarError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(e) => e.user_message().to_string(),
            Self::Native(_) => "Calendar operation failed".to_string(),
            Self::InFlight(_) => "Please wait for the current calendar update to finish.".to_string(),
            Self::LinkConflict(_) => "This trip already has a calendar reminder".to_string(),
            Self::DestinationNotFound(name) => format!("No destination named {}", name),
            Self::Catalog(_) => "Could not load the destination catalog".to_string(),
            Self::InvalidDate(date) => format!("Invalid travel date: {}", date),
        }
    }

    /// Whether the same request can succeed once the current one settles.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InFlight(_))
    }
}

impl From<rusqlite::Error> for CalendarError {
    fn from(e: rusqlite::Error) -> Self {
        use explora_core::RusqliteErrorExt;
        Self::Store(e.into_database_error())
    }
}

impl From<CalendarError> for AppError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::Store(db) => AppError::Database(db),
            other => AppError::Service(other.to_string()),
        }
    }
}
