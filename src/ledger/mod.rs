//! # Admission Ledger
//!
//! The durable record of who holds a seat, who is waitlisted and who is
//! invited. The registration engine and the lifecycle scheduler only ever
//! touch persisted state through these traits.
//!
//! A [`LedgerTransaction`] is one atomic unit of work. Dropping it without
//! calling [`LedgerTransaction::commit`] rolls back every write it made, which
//! is what makes `tokio::time::timeout` around an operation safe.
//!
//! ## Implementations
//!
//! - [`PgAdmissionLedger`] - PostgreSQL via sqlx, event rows locked `FOR UPDATE`
//! - [`InMemoryAdmissionLedger`] - serializable in-process store

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdmissionResult;
use crate::models::{Event, User, WaitlistEntry};
use crate::state_machine::{EventStatus, RegistrationStatus};

pub use memory::InMemoryAdmissionLedger;
pub use postgres::PgAdmissionLedger;

/// Operations available inside one admission transaction
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Load the event and hold it exclusively until commit or rollback
    async fn lock_event(&mut self, event_id: i64) -> AdmissionResult<Option<Event>>;

    async fn find_user(&mut self, user_id: i64) -> AdmissionResult<Option<User>>;

    async fn find_registration(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<RegistrationStatus>>;

    async fn find_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<WaitlistEntry>>;

    /// Case-insensitive guest list membership
    async fn has_invitation(&mut self, event_id: i64, email: &str) -> AdmissionResult<bool>;

    /// Seats currently held (`REGISTERED` only)
    async fn count_registered(&mut self, event_id: i64) -> AdmissionResult<i64>;

    async fn insert_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<()>;

    /// Delete a `REGISTERED` row; returns false if there was none
    async fn delete_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<bool>;

    /// Append to the waitlist; returns false if the pair was already queued
    async fn insert_waitlist_entry(&mut self, user_id: i64, event_id: i64)
        -> AdmissionResult<bool>;

    async fn delete_waitlist_entry(&mut self, user_id: i64, event_id: i64)
        -> AdmissionResult<bool>;

    /// Head of the FIFO queue (`created_at ASC, id ASC`)
    async fn oldest_waitlist_entry(&mut self, event_id: i64)
        -> AdmissionResult<Option<WaitlistEntry>>;

    /// `UPCOMING` events inside their window become `IN_PROGRESS`
    async fn advance_started(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64>;

    /// `UPCOMING`/`IN_PROGRESS` events past their end become `COMPLETED`
    async fn advance_completed(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64>;

    async fn commit(self: Box<Self>) -> AdmissionResult<()>;
}

/// Entry point for the engine and the scheduler
#[async_trait]
pub trait AdmissionLedger: Send + Sync + 'static {
    async fn begin(&self) -> AdmissionResult<Box<dyn LedgerTransaction>>;

    /// Read-only snapshot of an event's seats and queue
    async fn roster(&self, event_id: i64) -> AdmissionResult<Option<EventRoster>>;
}

/// Point-in-time view of who holds what for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRoster {
    pub event_id: i64,
    pub capacity: i32,
    pub status: EventStatus,
    /// User ids holding a seat
    pub registered: Vec<i64>,
    pub attended: Vec<i64>,
    /// User ids in promotion order
    pub waitlist: Vec<i64>,
}

impl EventRoster {
    pub fn seats_taken(&self) -> usize {
        self.registered.len()
    }

    pub fn seats_free(&self) -> usize {
        usize::try_from(self.capacity)
            .unwrap_or(0)
            .saturating_sub(self.registered.len())
    }

    pub fn is_waitlisted(&self, user_id: i64) -> bool {
        self.waitlist.contains(&user_id)
    }

    pub fn is_registered(&self, user_id: i64) -> bool {
        self.registered.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_seat_accounting() {
        let roster = EventRoster {
            event_id: 7,
            capacity: 3,
            status: EventStatus::Upcoming,
            registered: vec![1, 2],
            attended: vec![9],
            waitlist: vec![],
        };

        assert_eq!(roster.seats_taken(), 2);
        assert_eq!(roster.seats_free(), 1);
        assert!(roster.is_registered(2));
        assert!(!roster.is_registered(9));
        assert!(!roster.is_waitlisted(1));
    }
}
