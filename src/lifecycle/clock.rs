//! Pure mapping from an event's time window to its lifecycle status.

use chrono::{DateTime, Utc};

use crate::state_machine::EventStatus;

/// Stateless time rules shared by the scheduler SQL and the in-memory ledger
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStatusClock;

impl EventStatusClock {
    /// Status an event should have at `now`, ignoring any manual override.
    /// The window is half-open: `[start, end)` is in progress.
    pub fn status_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> EventStatus {
        if now < start {
            EventStatus::Upcoming
        } else if now < end {
            EventStatus::InProgress
        } else {
            EventStatus::Completed
        }
    }

    /// The correction to apply, if any. Only moves forward, never touches
    /// `Cancelled`.
    pub fn reconcile(
        current: EventStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<EventStatus> {
        let current_rank = current.progress_rank()?;
        let target = Self::status_at(start, end, now);
        let target_rank = target.progress_rank()?;

        (target_rank > current_rank).then_some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc::now();
        (start, start + Duration::hours(2))
    }

    #[test]
    fn test_status_at_boundaries() {
        let (start, end) = window();

        assert_eq!(
            EventStatusClock::status_at(start, end, start - Duration::seconds(1)),
            EventStatus::Upcoming
        );
        assert_eq!(
            EventStatusClock::status_at(start, end, start),
            EventStatus::InProgress
        );
        assert_eq!(
            EventStatusClock::status_at(start, end, end - Duration::seconds(1)),
            EventStatus::InProgress
        );
        assert_eq!(
            EventStatusClock::status_at(start, end, end),
            EventStatus::Completed
        );
    }

    #[test]
    fn test_reconcile_moves_forward_only() {
        let (start, end) = window();
        let during = start + Duration::minutes(30);

        assert_eq!(
            EventStatusClock::reconcile(EventStatus::Upcoming, start, end, during),
            Some(EventStatus::InProgress)
        );
        assert_eq!(
            EventStatusClock::reconcile(EventStatus::InProgress, start, end, during),
            None
        );
        // A completed event is not pulled back if the clock says otherwise
        assert_eq!(
            EventStatusClock::reconcile(EventStatus::Completed, start, end, during),
            None
        );
    }

    #[test]
    fn test_reconcile_skips_straight_to_completed() {
        let (start, end) = window();
        assert_eq!(
            EventStatusClock::reconcile(EventStatus::Upcoming, start, end, end + Duration::hours(1)),
            Some(EventStatus::Completed)
        );
    }

    #[test]
    fn test_cancelled_is_never_reconciled() {
        let (start, end) = window();
        for now in [start - Duration::hours(1), start, end] {
            assert_eq!(
                EventStatusClock::reconcile(EventStatus::Cancelled, start, end, now),
                None
            );
        }
    }
}
