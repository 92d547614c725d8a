//! Result of a reminder toggle and its user-facing notice.

/// Why a reminder operation ended in failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The calendar returned no event id.
    CreateRefused,
    /// The calendar reported the event could not be removed.
    DeleteRefused,
    /// The destination lacks a start or end date.
    MissingTravelDates,
    /// The caller's view of the link no longer matches the store.
    StaleLink {
        shown: Option<String>,
        stored: Option<String>,
    },
    /// Anything else, with a description for the logs.
    Unexpected(String),
}

/// Terminal state of one reminder operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Linked(String),
    Unlinked,
    PermissionDenied,
    PermissionBlocked,
    CalendarUnavailable,
    OperationFailed(FailureReason),
}

/// What a front end should show for an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
    /// Offer an "Open Settings" action next to the message.
    pub settings_action: bool,
}

impl Notice {
    fn plain(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
            settings_action: false,
        }
    }
}

impl ReminderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Linked(_) | Self::Unlinked)
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::Linked(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Short tag used in logs and CLI output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Linked(_) => "linked",
            Self::Unlinked => "unlinked",
            Self::PermissionDenied => "permission_denied",
            Self::PermissionBlocked => "permission_blocked",
            Self::CalendarUnavailable => "calendar_unavailable",
            Self::OperationFailed(_) => "operation_failed",
        }
    }

    pub fn notice(&self, destination_name: &str) -> Notice {
        match self {
            Self::Linked(_) => Notice::plain(
                "Added to calendar",
                format!("Your trip to {} is in your calendar.", destination_name),
            ),
            Self::Unlinked => Notice::plain(
                "Removed",
                format!("Your trip to {} was removed from your calendar.", destination_name),
            ),
            Self::PermissionDenied => Notice::plain(
                "Calendar Access Denied",
                "Calendar access is required to create travel reminders.",
            ),
            Self::PermissionBlocked => Notice {
                title: "Calendar Access Denied",
                message: "Please enable calendar access in Settings to create travel reminders."
                    .to_string(),
                settings_action: true,
            },
            Self::CalendarUnavailable => {
                Notice::plain("Error", "Calendar is not available on this device")
            }
            Self::OperationFailed(reason) => match reason {
                FailureReason::CreateRefused => {
                    Notice::plain("Error", "Failed to create calendar event")
                }
                FailureReason::DeleteRefused => {
                    Notice::plain("Error", "Failed to remove event from calendar")
                }
                FailureReason::MissingTravelDates => Notice::plain(
                    "Error",
                    format!("{} has no suggested travel dates", destination_name),
                ),
                FailureReason::StaleLink { .. } => Notice::plain(
                    "Error",
                    format!("The reminder for {} changed. Refresh and try again.", destination_name),
                ),
                FailureReason::Unexpected(_) => Notice::plain("Error", "Calendar operation failed"),
            },
        }
    }
}
