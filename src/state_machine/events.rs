use serde::{Deserialize, Serialize};

use super::errors::{StateMachineError, StateMachineResult};
use super::states::AdmissionState;

/// Events that move a (user, event) pair through the admission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionEvent {
    /// Register with a free seat available
    Admit,
    /// Register while the event is full
    Enqueue,
    /// Move the oldest waitlisted user into a released seat
    Promote,
    /// User cancels their seat or leaves the waitlist
    Withdraw,
    /// Check-in collaborator marks attendance
    CheckIn,
}

impl AdmissionEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Enqueue => "enqueue",
            Self::Promote => "promote",
            Self::Withdraw => "withdraw",
            Self::CheckIn => "check_in",
        }
    }
}

impl AdmissionState {
    /// Apply an event, returning the next state.
    ///
    /// `Enqueue` on an already waitlisted pair is accepted and leaves it in
    /// place, which is what makes repeated registration attempts idempotent.
    pub fn apply(self, event: AdmissionEvent) -> StateMachineResult<AdmissionState> {
        let next = match (self, event) {
            (Self::None, AdmissionEvent::Admit) => Self::Registered,
            (Self::None, AdmissionEvent::Enqueue) => Self::Waitlisted,

            (Self::Waitlisted, AdmissionEvent::Enqueue) => Self::Waitlisted,
            (Self::Waitlisted, AdmissionEvent::Admit) => Self::Registered,
            (Self::Waitlisted, AdmissionEvent::Promote) => Self::Registered,
            (Self::Waitlisted, AdmissionEvent::Withdraw) => Self::None,

            (Self::Registered, AdmissionEvent::Withdraw) => Self::None,
            (Self::Registered, AdmissionEvent::CheckIn) => Self::Attended,

            (from, event) => {
                return Err(StateMachineError::InvalidTransition { from, event });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_paths() {
        assert_eq!(
            AdmissionState::None.apply(AdmissionEvent::Admit).unwrap(),
            AdmissionState::Registered
        );
        assert_eq!(
            AdmissionState::None.apply(AdmissionEvent::Enqueue).unwrap(),
            AdmissionState::Waitlisted
        );
        assert_eq!(
            AdmissionState::Waitlisted
                .apply(AdmissionEvent::Promote)
                .unwrap(),
            AdmissionState::Registered
        );
    }

    #[test]
    fn test_duplicate_enqueue_is_noop() {
        assert_eq!(
            AdmissionState::Waitlisted
                .apply(AdmissionEvent::Enqueue)
                .unwrap(),
            AdmissionState::Waitlisted
        );
    }

    #[test]
    fn test_attended_is_terminal() {
        for event in [
            AdmissionEvent::Admit,
            AdmissionEvent::Enqueue,
            AdmissionEvent::Promote,
            AdmissionEvent::Withdraw,
            AdmissionEvent::CheckIn,
        ] {
            assert!(AdmissionState::Attended.apply(event).is_err());
        }
    }

    #[test]
    fn test_registered_never_returns_to_waitlist() {
        assert!(AdmissionState::Registered
            .apply(AdmissionEvent::Enqueue)
            .is_err());
        assert!(AdmissionState::Registered
            .apply(AdmissionEvent::Promote)
            .is_err());
    }

    #[test]
    fn test_withdraw_without_membership_rejected() {
        let err = AdmissionState::None
            .apply(AdmissionEvent::Withdraw)
            .unwrap_err();
        assert_eq!(
            err,
            StateMachineError::InvalidTransition {
                from: AdmissionState::None,
                event: AdmissionEvent::Withdraw,
            }
        );
    }
}
