use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::messages;

/// Where a successful register call left the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionStatus {
    Registered,
    Waitlisted,
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => f.write_str("REGISTERED"),
            Self::Waitlisted => f.write_str("WAITLISTED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResult {
    pub status: AdmissionStatus,
    pub message: String,
}

impl RegisterResult {
    pub fn registered() -> Self {
        Self {
            status: AdmissionStatus::Registered,
            message: messages::REGISTERED.to_string(),
        }
    }

    pub fn waitlisted() -> Self {
        Self {
            status: AdmissionStatus::Waitlisted,
            message: messages::WAITLISTED.to_string(),
        }
    }

    /// Repeat registration by someone already in the queue
    pub fn already_waitlisted() -> Self {
        Self {
            status: AdmissionStatus::Waitlisted,
            message: messages::ALREADY_WAITLISTED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// A seat was given up; the head of the waitlist took it, if there was one
    SeatReleased { promoted_user_id: Option<i64> },
    /// The user only had a waitlist position; nobody is promoted
    LeftWaitlist,
}

impl CancelOutcome {
    pub fn promoted_user_id(&self) -> Option<i64> {
        match self {
            Self::SeatReleased { promoted_user_id } => *promoted_user_id,
            Self::LeftWaitlist => None,
        }
    }
}

impl fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeatReleased {
                promoted_user_id: Some(id),
            } => write!(f, "seat_released(promoted={id})"),
            Self::SeatReleased {
                promoted_user_id: None,
            } => f.write_str("seat_released"),
            Self::LeftWaitlist => f.write_str("left_waitlist"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_result_wire_shape() {
        let json = serde_json::to_value(RegisterResult::waitlisted()).unwrap();
        assert_eq!(json["status"], "WAITLISTED");
        assert_eq!(
            json["message"],
            "Event is full. You have been added to the waitlist."
        );
    }

    #[test]
    fn test_cancel_outcome_promoted_user() {
        let outcome = CancelOutcome::SeatReleased {
            promoted_user_id: Some(4),
        };
        assert_eq!(outcome.promoted_user_id(), Some(4));
        assert_eq!(CancelOutcome::LeftWaitlist.promoted_user_id(), None);
        assert_eq!(outcome.to_string(), "seat_released(promoted=4)");
    }
}
