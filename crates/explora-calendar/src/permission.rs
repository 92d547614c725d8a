//! Calendar access permission: status model, provider seam, and the
//! desktop provider driven by configuration.

use async_trait::async_trait;
use explora_core::CalendarAccess;
use parking_lot::Mutex;

use crate::error::CalendarError;

/// OS-level calendar authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Partial access that still allows adding events.
    Limited,
    /// Not yet asked; a request may still succeed.
    Denied,
    /// Permanently denied; only system settings can change it.
    Blocked,
    /// No calendar facility on this device.
    Unavailable,
}

impl PermissionStatus {
    pub fn allows_events(self) -> bool {
        matches!(self, Self::Granted | Self::Limited)
    }
}

impl From<CalendarAccess> for PermissionStatus {
    fn from(access: CalendarAccess) -> Self {
        match access {
            CalendarAccess::Granted => Self::Granted,
            CalendarAccess::Limited => Self::Limited,
            CalendarAccess::Denied => Self::Denied,
            CalendarAccess::Blocked => Self::Blocked,
            CalendarAccess::Unavailable => Self::Unavailable,
        }
    }
}

/// Source of calendar authorization.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current status, without prompting.
    async fn check(&self) -> Result<PermissionStatus, CalendarError>;

    /// Prompt the user once and return the resulting status.
    async fn request(&self) -> Result<PermissionStatus, CalendarError>;

    /// Send the user to the system settings page for calendar access.
    async fn open_settings(&self) -> Result<(), CalendarError>;
}

/// Result of resolving access before creating an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
    Blocked,
    Unavailable,
}

/// Check the current status and, only from `Denied`, issue a single request.
pub async fn resolve_access(
    provider: &dyn PermissionProvider,
) -> Result<AccessDecision, CalendarError> {
    let status = provider.check().await?;
    tracing::debug!("Calendar permission status: {:?}", status);

    let decision = match status {
        PermissionStatus::Granted | PermissionStatus::Limited => AccessDecision::Allowed,
        PermissionStatus::Denied => {
            let requested = provider.request().await?;
            tracing::info!("Calendar permission request returned {:?}", requested);
            // Only an explicit grant counts after a prompt.
            if requested == PermissionStatus::Granted {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied
            }
        }
        PermissionStatus::Blocked => AccessDecision::Blocked,
        PermissionStatus::Unavailable => AccessDecision::Unavailable,
    };

    Ok(decision)
}

/// Desktop provider: status comes from configuration, prompts are answered
/// by `grant_on_request`.
pub struct ConfiguredPermissions {
    status: Mutex<PermissionStatus>,
    grant_on_request: bool,
}

impl ConfiguredPermissions {
    pub fn new(status: PermissionStatus, grant_on_request: bool) -> Self {
        Self {
            status: Mutex::new(status),
            grant_on_request,
        }
    }

    pub fn from_config(config: &explora_core::CalendarConfig) -> Self {
        Self::new(config.access.into(), config.grant_on_request)
    }

    pub fn status(&self) -> PermissionStatus {
        *self.status.lock()
    }
}

#[async_trait]
impl PermissionProvider for ConfiguredPermissions {
    async fn check(&self) -> Result<PermissionStatus, CalendarError> {
        Ok(self.status())
    }

    async fn request(&self) -> Result<PermissionStatus, CalendarError> {
        let mut status = self.status.lock();
        if *status == PermissionStatus::Denied {
            // A refused prompt is final, as on the OS.
            *status = if self.grant_on_request {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Blocked
            };
        }
        Ok(*status)
    }

    async fn open_settings(&self) -> Result<(), CalendarError> {
        tracing::info!(
            "Calendar access is {:?}; set calendar.access in config.toml to change it",
            self.status()
        );
        Ok(())
    }
}
