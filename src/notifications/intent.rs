use serde::{Deserialize, Serialize};
use std::fmt;

/// Which message the recipient should get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmed,
    Waitlisted,
    /// Moved off the waitlist into a released seat
    Promoted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Waitlisted => "waitlisted",
            Self::Promoted => "promoted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "This user must be told X", emitted by the engine after commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient_email: String,
    pub user_id: i64,
    pub event_id: i64,
    pub kind: NotificationKind,
    pub event_title: String,
}

impl NotificationIntent {
    pub fn subject(&self) -> &'static str {
        match self.kind {
            NotificationKind::Confirmed => "Registration Confirmed!",
            NotificationKind::Waitlisted => "Added to Waitlist",
            NotificationKind::Promoted => "A Seat Opened Up!",
        }
    }

    pub fn body(&self) -> String {
        match self.kind {
            NotificationKind::Confirmed => format!("You are going to {}!", self.event_title),
            NotificationKind::Waitlisted => {
                format!("You are on the waitlist for {}.", self.event_title)
            }
            NotificationKind::Promoted => format!(
                "A seat opened up and you are now registered for {}!",
                self.event_title
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_text_names_the_event() {
        let intent = NotificationIntent {
            recipient_email: "b@example.com".into(),
            user_id: 2,
            event_id: 1,
            kind: NotificationKind::Promoted,
            event_title: "RustConf".into(),
        };

        assert!(intent.body().contains("RustConf"));
        assert_eq!(intent.subject(), "A Seat Opened Up!");
        assert_eq!(
            serde_json::to_value(intent.kind).unwrap(),
            serde_json::json!("promoted")
        );
    }
}
