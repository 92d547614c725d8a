//! Calendar reminders for Explora destinations.
//!
//! Links destinations to events in the platform calendar and keeps that
//! mapping in a local SQLite store.

pub mod destination;
pub mod error;
pub mod local;
pub mod native;
pub mod outcome;
pub mod permission;
pub mod store;
pub mod sync;

pub use destination::{Catalog, Destination, GeoPoint};
pub use error::CalendarError;
pub use local::{LocalCalendar, LocalEvent};
pub use native::{NativeCalendar, NewEvent};
pub use outcome::{FailureReason, Notice, ReminderOutcome};
pub use permission::{ConfiguredPermissions, PermissionProvider, PermissionStatus};
pub use store::{CalendarLink, LinkStore};
pub use sync::{ReminderSettings, ReminderSynchronizer, SyncPhase};
