use serde::{Deserialize, Serialize};
use std::fmt;

/// Event lifecycle states. Everything except `Cancelled` is derived from time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Event has not started yet
    Upcoming,
    /// Start time has passed, end time has not
    InProgress,
    /// End time has passed
    Completed,
    /// Explicitly cancelled by an organizer; permanent
    Cancelled,
}

impl EventStatus {
    /// Check if this is a terminal state (the scheduler never moves it again)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Check if registrations are still accepted in this state
    pub fn admits_registrations(&self) -> bool {
        !self.is_terminal()
    }

    /// Ordering along the time-driven path; `None` for the manual override
    pub(crate) fn progress_rank(&self) -> Option<u8> {
        match self {
            Self::Upcoming => Some(0),
            Self::InProgress => Some(1),
            Self::Completed => Some(2),
            Self::Cancelled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(Self::Upcoming),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid event status: {s}")),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        Self::Upcoming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventVisibility {
    Public,
    /// Only invited e-mail addresses may register
    Private,
}

impl EventVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for EventVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Self::Public),
            "PRIVATE" => Ok(Self::Private),
            _ => Err(format!("Invalid event visibility: {s}")),
        }
    }
}

impl TryFrom<String> for EventVisibility {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Default for EventVisibility {
    fn default() -> Self {
        Self::Public
    }
}

/// Persisted registration row status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    /// Holds a seat
    Registered,
    /// Checked in; owned by the check-in collaborator
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Attended => "ATTENDED",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "ATTENDED" => Ok(Self::Attended),
            _ => Err(format!("Invalid registration status: {s}")),
        }
    }
}

impl TryFrom<String> for RegistrationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a (user, event) pair currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionState {
    /// No registration and no waitlist entry
    None,
    Waitlisted,
    Registered,
    /// Terminal
    Attended,
}

impl AdmissionState {
    /// Derive the pair's state from what the ledger holds for it
    pub fn from_records(registration: Option<RegistrationStatus>, waitlisted: bool) -> Self {
        match (registration, waitlisted) {
            (Some(RegistrationStatus::Attended), _) => Self::Attended,
            (Some(RegistrationStatus::Registered), _) => Self::Registered,
            (None, true) => Self::Waitlisted,
            (None, false) => Self::None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Attended)
    }

    /// Whether the pair currently occupies a seat
    pub fn holds_seat(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

impl fmt::Display for AdmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Waitlisted => write!(f, "WAITLISTED"),
            Self::Registered => write!(f, "REGISTERED"),
            Self::Attended => write!(f, "ATTENDED"),
        }
    }
}

impl Default for AdmissionState {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_status_terminal_check() {
        assert!(EventStatus::Completed.is_terminal());
        assert!(EventStatus::Cancelled.is_terminal());
        assert!(!EventStatus::Upcoming.is_terminal());
        assert!(!EventStatus::InProgress.is_terminal());
        assert!(EventStatus::InProgress.admits_registrations());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(EventStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(
            "CANCELLED".parse::<EventStatus>().unwrap(),
            EventStatus::Cancelled
        );
        assert_eq!(
            EventVisibility::try_from("PRIVATE".to_string()).unwrap(),
            EventVisibility::Private
        );
        assert!("attended".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn test_admission_state_from_records() {
        assert_eq!(AdmissionState::from_records(None, false), AdmissionState::None);
        assert_eq!(
            AdmissionState::from_records(None, true),
            AdmissionState::Waitlisted
        );
        assert_eq!(
            AdmissionState::from_records(Some(RegistrationStatus::Attended), false),
            AdmissionState::Attended
        );
        assert!(AdmissionState::from_records(Some(RegistrationStatus::Registered), false)
            .holds_seat());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let parsed: EventStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EventStatus::InProgress);
    }
}
