//! Reminder synchronizer: keeps the platform calendar and the link store in
//! step for each destination.
//!
//! Create path: permission check, create event, persist link.
//! Delete path: delete event, clear link.
//!
//! The link store is written only after the calendar confirms the change, and
//! at most one operation runs per destination at a time.

use std::collections::HashMap;
use std::sync::Arc;

use explora_core::{ReminderConfig, DEFAULT_LEAD_TIME_MINUTES};
use parking_lot::Mutex;

use crate::destination::Destination;
use crate::error::CalendarError;
use crate::native::{NativeCalendar, NewEvent};
use crate::outcome::{FailureReason, ReminderOutcome};
use crate::permission::{resolve_access, AccessDecision, PermissionProvider};
use crate::store::{CalendarLink, LinkStore};

/// Phase of an in-flight operation for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    CheckingPermission,
    Creating,
    Deleting,
}

/// How reminder events are built from a destination.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub lead_time_minutes: u32,
    pub title_prefix: String,
    pub include_coordinates: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lead_time_minutes: DEFAULT_LEAD_TIME_MINUTES,
            title_prefix: "Travel to".to_string(),
            include_coordinates: true,
        }
    }
}

impl From<&ReminderConfig> for ReminderSettings {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            lead_time_minutes: config.lead_time_minutes,
            title_prefix: config.title_prefix.clone(),
            include_coordinates: config.include_coordinates,
        }
    }
}

type PhaseTable = Arc<Mutex<HashMap<String, SyncPhase>>>;

/// Marks a destination busy until dropped.
struct InFlightGuard {
    key: String,
    table: PhaseTable,
}

impl InFlightGuard {
    fn acquire(table: &PhaseTable, key: &str) -> Result<Self, CalendarError> {
        let mut phases = table.lock();
        if phases.contains_key(key) {
            return Err(CalendarError::InFlight(key.to_string()));
        }
        phases.insert(key.to_string(), SyncPhase::Idle);
        Ok(Self {
            key: key.to_string(),
            table: Arc::clone(table),
        })
    }

    fn set_phase(&self, phase: SyncPhase) {
        tracing::trace!("{} -> {:?}", self.key, phase);
        self.table.lock().insert(self.key.clone(), phase);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.lock().remove(&self.key);
    }
}

/// Coordinates permissions, the platform calendar and the link store.
pub struct ReminderSynchronizer {
    permissions: Arc<dyn PermissionProvider>,
    calendar: Arc<dyn NativeCalendar>,
    store: Arc<LinkStore>,
    settings: ReminderSettings,
    in_flight: PhaseTable,
}

impl ReminderSynchronizer {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        calendar: Arc<dyn NativeCalendar>,
        store: Arc<LinkStore>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            permissions,
            calendar,
            store,
            settings,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<LinkStore> {
        &self.store
    }

    /// True while an operation for this destination is running.
    pub fn is_pending(&self, destination_key: &str) -> bool {
        self.in_flight.lock().contains_key(destination_key)
    }

    pub fn phase(&self, destination_key: &str) -> SyncPhase {
        self.in_flight
            .lock()
            .get(destination_key)
            .copied()
            .unwrap_or_default()
    }

    /// Event currently linked to a destination.
    pub async fn linked_event(&self, destination_key: &str) -> Result<Option<String>, CalendarError> {
        let key = destination_key.to_string();
        self.with_store(move |store| store.get(&key)).await
    }

    /// Forget a link without touching the calendar.
    pub async fn dissociate(&self, destination_key: &str) -> Result<bool, CalendarError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, destination_key)?;
        let key = destination_key.to_string();
        let removed = self.with_store(move |store| store.remove(&key)).await?;
        if removed {
            tracing::info!("Dissociated calendar event from {}", destination_key);
        }
        Ok(removed)
    }

    /// Forget whichever destination is linked to `event_id`, for events
    /// removed from the calendar by other means. Returns the destination key.
    pub async fn dissociate_event(&self, event_id: &str) -> Result<Option<String>, CalendarError> {
        let links = self.links().await?;
        let Some(link) = links.into_iter().find(|l| l.event_id == event_id) else {
            return Ok(None);
        };

        let _guard = InFlightGuard::acquire(&self.in_flight, &link.destination_key)?;
        let event_id = event_id.to_string();
        let removed = self
            .with_store(move |store| store.remove_by_event_id(&event_id))
            .await?;
        if let Some(key) = &removed {
            tracing::info!("Dissociated calendar event {} from {}", link.event_id, key);
        }
        Ok(removed)
    }

    /// Every stored link, ordered by destination key.
    pub async fn links(&self) -> Result<Vec<CalendarLink>, CalendarError> {
        self.with_store(|store| store.list()).await
    }

    /// Forward to the permission provider's settings action.
    pub async fn open_settings(&self) -> Result<(), CalendarError> {
        self.permissions.open_settings().await
    }

    /// Add the reminder if none is linked, otherwise remove it.
    ///
    /// `existing_event_id` is the link the caller currently shows. It must
    /// match the stored link; a stale view fails without touching the
    /// calendar.
    pub async fn toggle_reminder(
        &self,
        destination: &Destination,
        existing_event_id: Option<&str>,
    ) -> Result<ReminderOutcome, CalendarError> {
        let guard = InFlightGuard::acquire(&self.in_flight, destination.key())?;
        let outcome = match self.stored_link(destination).await {
            Ok(stored) if stored.as_deref() != existing_event_id => {
                tracing::warn!(
                    "Stale reminder state for {}: caller has {:?}, store has {:?}",
                    destination.key(),
                    existing_event_id,
                    stored
                );
                ReminderOutcome::OperationFailed(FailureReason::StaleLink {
                    shown: existing_event_id.map(str::to_string),
                    stored,
                })
            }
            Ok(Some(event_id)) => self.delete_linked(&guard, destination, &event_id).await,
            Ok(None) => self.create_linked(&guard, destination).await,
            Err(outcome) => outcome,
        };
        Ok(self.report(destination, outcome))
    }

    /// Toggle based on the link currently stored for the destination.
    pub async fn toggle(&self, destination: &Destination) -> Result<ReminderOutcome, CalendarError> {
        let guard = InFlightGuard::acquire(&self.in_flight, destination.key())?;
        let outcome = match self.stored_link(destination).await {
            Ok(Some(event_id)) => self.delete_linked(&guard, destination, &event_id).await,
            Ok(None) => self.create_linked(&guard, destination).await,
            Err(outcome) => outcome,
        };
        Ok(self.report(destination, outcome))
    }

    /// Create a reminder unless one is already linked.
    pub async fn add_reminder(
        &self,
        destination: &Destination,
    ) -> Result<ReminderOutcome, CalendarError> {
        let guard = InFlightGuard::acquire(&self.in_flight, destination.key())?;
        let outcome = match self.stored_link(destination).await {
            Ok(Some(event_id)) => {
                tracing::debug!("{} already linked to {}", destination.key(), event_id);
                ReminderOutcome::Linked(event_id)
            }
            Ok(None) => self.create_linked(&guard, destination).await,
            Err(outcome) => outcome,
        };
        Ok(self.report(destination, outcome))
    }

    /// Remove the linked reminder; without a link this is a no-op.
    pub async fn remove_reminder(
        &self,
        destination: &Destination,
    ) -> Result<ReminderOutcome, CalendarError> {
        let guard = InFlightGuard::acquire(&self.in_flight, destination.key())?;
        let outcome = match self.stored_link(destination).await {
            Ok(Some(event_id)) => self.delete_linked(&guard, destination, &event_id).await,
            Ok(None) => ReminderOutcome::Unlinked,
            Err(outcome) => outcome,
        };
        Ok(self.report(destination, outcome))
    }

    /// Build the event for a destination, if it has both travel dates.
    pub fn event_for(&self, destination: &Destination) -> Option<NewEvent> {
        let (start, end) = destination.travel_dates()?;
        Some(NewEvent {
            title: destination.event_title(&self.settings.title_prefix),
            start_date: start.to_string(),
            end_date: end.to_string(),
            location: destination.location_string(self.settings.include_coordinates),
            notes: destination.description.clone(),
            reminder_minutes_before: Some(self.settings.lead_time_minutes),
        })
    }

    async fn create_linked(&self, guard: &InFlightGuard, destination: &Destination) -> ReminderOutcome {
        let Some(event) = self.event_for(destination) else {
            return ReminderOutcome::OperationFailed(FailureReason::MissingTravelDates);
        };

        guard.set_phase(SyncPhase::CheckingPermission);
        match resolve_access(self.permissions.as_ref()).await {
            Ok(AccessDecision::Allowed) => {}
            Ok(AccessDecision::Denied) => return ReminderOutcome::PermissionDenied,
            Ok(AccessDecision::Blocked) => return ReminderOutcome::PermissionBlocked,
            Ok(AccessDecision::Unavailable) => return ReminderOutcome::CalendarUnavailable,
            Err(e) => return unexpected(e),
        }

        guard.set_phase(SyncPhase::Creating);
        let event_id = match self.calendar.create_event(&event).await {
            Ok(Some(id)) if !id.trim().is_empty() => id,
            Ok(_) => return ReminderOutcome::OperationFailed(FailureReason::CreateRefused),
            Err(e) => return unexpected(e),
        };

        let key = destination.key().to_string();
        let linked = event_id.clone();
        let saved = self
            .with_store(move |store| {
                if store.link(&key, &linked)? {
                    Ok(())
                } else {
                    Err(CalendarError::LinkConflict(key))
                }
            })
            .await;
        match saved {
            Ok(()) => ReminderOutcome::Linked(event_id),
            Err(e) => {
                tracing::error!(
                    "Created event {} for {} but could not save the link: {}",
                    event_id,
                    destination.key(),
                    e
                );
                unexpected(e)
            }
        }
    }

    async fn delete_linked(
        &self,
        guard: &InFlightGuard,
        destination: &Destination,
        event_id: &str,
    ) -> ReminderOutcome {
        guard.set_phase(SyncPhase::Deleting);
        match self.calendar.delete_event(event_id).await {
            Ok(true) => {}
            Ok(false) => return ReminderOutcome::OperationFailed(FailureReason::DeleteRefused),
            Err(e) => return unexpected(e),
        }

        let key = destination.key().to_string();
        match self.with_store(move |store| store.remove(&key)).await {
            Ok(_) => ReminderOutcome::Unlinked,
            Err(e) => {
                tracing::error!(
                    "Deleted event {} for {} but could not clear the link: {}",
                    event_id,
                    destination.key(),
                    e
                );
                unexpected(e)
            }
        }
    }

    async fn stored_link(&self, destination: &Destination) -> Result<Option<String>, ReminderOutcome> {
        self.linked_event(destination.key()).await.map_err(unexpected)
    }

    fn report(&self, destination: &Destination, outcome: ReminderOutcome) -> ReminderOutcome {
        match &outcome {
            ReminderOutcome::Linked(id) => {
                tracing::info!("Linked {} to calendar event {}", destination.key(), id)
            }
            ReminderOutcome::Unlinked => {
                tracing::info!("Unlinked calendar event from {}", destination.key())
            }
            ReminderOutcome::OperationFailed(reason) => {
                tracing::warn!("Reminder update for {} failed: {:?}", destination.key(), reason)
            }
            other => tracing::info!("Reminder update for {}: {}", destination.key(), other.tag()),
        }
        outcome
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, CalendarError>
    where
        F: FnOnce(&LinkStore) -> Result<T, CalendarError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| CalendarError::Native(format!("store task failed: {}", e)))?
    }
}

fn unexpected(error: CalendarError) -> ReminderOutcome {
    tracing::error!("Calendar operation failed: {}", error);
    ReminderOutcome::OperationFailed(FailureReason::Unexpected(error.to_string()))
}
