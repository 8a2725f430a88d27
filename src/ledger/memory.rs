//! In-process ledger.
//!
//! Every transaction holds the store's mutex from `begin` until it is
//! committed or dropped, so transactions are fully serialized. Writes go to a
//! staged copy that replaces the store on commit.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{AdmissionLedger, EventRoster, LedgerTransaction};
use crate::error::{AdmissionError, AdmissionResult};
use crate::lifecycle::EventStatusClock;
use crate::models::{Event, NewEvent, NewUser, Registration, User, WaitlistEntry};
use crate::state_machine::{AdmissionEvent, AdmissionState, EventStatus, RegistrationStatus};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    events: Vec<Event>,
    users: Vec<User>,
    registrations: Vec<Registration>,
    waitlist: Vec<WaitlistEntry>,
    invitations: BTreeSet<(i64, String)>,
    next_event_id: i64,
    next_user_id: i64,
    next_registration_id: i64,
    next_waitlist_id: i64,
}

impl LedgerState {
    fn event(&self, event_id: i64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    fn event_mut(&mut self, event_id: i64) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    fn registration(&self, user_id: i64, event_id: i64) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.user_id == user_id && r.event_id == event_id)
    }

    fn waitlist_for_event(&self, event_id: i64) -> Vec<&WaitlistEntry> {
        let mut entries: Vec<_> = self
            .waitlist
            .iter()
            .filter(|w| w.event_id == event_id)
            .collect();
        entries.sort_by_key(|w| (w.created_at, w.id));
        entries
    }

    /// Apply the clock to every event, moving only those whose correction is
    /// `target`
    fn advance_to(&mut self, target: EventStatus, now: DateTime<Utc>) -> u64 {
        let mut changed = 0;
        for event in &mut self.events {
            let correction =
                EventStatusClock::reconcile(event.status, event.start_time, event.end_time, now);
            if correction == Some(target) {
                event.status = target;
                event.updated_at = now;
                changed += 1;
            }
        }
        changed
    }
}

/// Serializable in-memory [`AdmissionLedger`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdmissionLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryAdmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an event in `UPCOMING` status, as the event-management
    /// collaborator does. Rows the `events` table would refuse are rejected.
    pub async fn insert_event(&self, new_event: NewEvent) -> AdmissionResult<Event> {
        new_event.validate()?;

        let mut state = self.state.lock().await;
        state.next_event_id += 1;
        let now = Utc::now();

        let event = Event {
            id: state.next_event_id,
            title: new_event.title,
            capacity: new_event.capacity,
            visibility: new_event.visibility,
            status: EventStatus::Upcoming,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            created_at: now,
            updated_at: now,
        };
        state.events.push(event.clone());
        Ok(event)
    }

    pub async fn insert_user(&self, new_user: NewUser) -> User {
        let mut state = self.state.lock().await;
        state.next_user_id += 1;

        let user = User {
            id: state.next_user_id,
            email: new_user.email.to_lowercase(),
            subject: new_user.subject,
            role: new_user.role,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    /// Add an address to a private event's guest list
    pub async fn invite(&self, event_id: i64, email: &str) -> bool {
        let mut state = self.state.lock().await;
        state.invitations.insert((event_id, email.to_lowercase()))
    }

    /// Organizer override
    pub async fn cancel_event(&self, event_id: i64) -> bool {
        let mut state = self.state.lock().await;
        match state.event_mut(event_id) {
            Some(event) => {
                event.status = EventStatus::Cancelled;
                event.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Check-in collaborator entry point
    pub async fn mark_attended(&self, user_id: i64, event_id: i64) -> bool {
        let mut state = self.state.lock().await;
        let Some(registration) = state
            .registrations
            .iter_mut()
            .find(|r| r.user_id == user_id && r.event_id == event_id)
        else {
            return false;
        };

        match AdmissionState::from_records(Some(registration.status), false)
            .apply(AdmissionEvent::CheckIn)
        {
            Ok(_) => {
                registration.status = RegistrationStatus::Attended;
                true
            }
            Err(_) => false,
        }
    }

    pub async fn event(&self, event_id: i64) -> Option<Event> {
        self.state.lock().await.event(event_id).cloned()
    }
}

#[async_trait]
impl AdmissionLedger for InMemoryAdmissionLedger {
    async fn begin(&self) -> AdmissionResult<Box<dyn LedgerTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryLedgerTransaction { guard, staged }))
    }

    async fn roster(&self, event_id: i64) -> AdmissionResult<Option<EventRoster>> {
        let state = self.state.lock().await;
        let Some(event) = state.event(event_id) else {
            return Ok(None);
        };

        let mut registrations: Vec<_> = state
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .collect();
        registrations.sort_by_key(|r| (r.created_at, r.id));

        let users_with = |status: RegistrationStatus| {
            registrations
                .iter()
                .filter(|r| r.status == status)
                .map(|r| r.user_id)
                .collect::<Vec<_>>()
        };

        Ok(Some(EventRoster {
            event_id,
            capacity: event.capacity,
            status: event.status,
            registered: users_with(RegistrationStatus::Registered),
            attended: users_with(RegistrationStatus::Attended),
            waitlist: state
                .waitlist_for_event(event_id)
                .into_iter()
                .map(|w| w.user_id)
                .collect(),
        }))
    }
}

struct MemoryLedgerTransaction {
    guard: OwnedMutexGuard<LedgerState>,
    staged: LedgerState,
}

#[async_trait]
impl LedgerTransaction for MemoryLedgerTransaction {
    async fn lock_event(&mut self, event_id: i64) -> AdmissionResult<Option<Event>> {
        Ok(self.staged.event(event_id).cloned())
    }

    async fn find_user(&mut self, user_id: i64) -> AdmissionResult<Option<User>> {
        Ok(self.staged.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_registration(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<RegistrationStatus>> {
        Ok(self.staged.registration(user_id, event_id).map(|r| r.status))
    }

    async fn find_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<WaitlistEntry>> {
        Ok(self
            .staged
            .waitlist
            .iter()
            .find(|w| w.user_id == user_id && w.event_id == event_id)
            .cloned())
    }

    async fn has_invitation(&mut self, event_id: i64, email: &str) -> AdmissionResult<bool> {
        Ok(self
            .staged
            .invitations
            .contains(&(event_id, email.to_lowercase())))
    }

    async fn count_registered(&mut self, event_id: i64) -> AdmissionResult<i64> {
        let count = self
            .staged
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Registered)
            .count();
        Ok(count as i64)
    }

    async fn insert_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<()> {
        if self.staged.registration(user_id, event_id).is_some() {
            return Err(AdmissionError::Storage(format!(
                "duplicate registration for user {user_id} on event {event_id}"
            )));
        }

        self.staged.next_registration_id += 1;
        let registration = Registration {
            id: self.staged.next_registration_id,
            user_id,
            event_id,
            status: RegistrationStatus::Registered,
            created_at: Utc::now(),
        };
        self.staged.registrations.push(registration);
        Ok(())
    }

    async fn delete_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<bool> {
        let before = self.staged.registrations.len();
        self.staged.registrations.retain(|r| {
            !(r.user_id == user_id
                && r.event_id == event_id
                && r.status == RegistrationStatus::Registered)
        });
        Ok(self.staged.registrations.len() < before)
    }

    async fn insert_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<bool> {
        let exists = self
            .staged
            .waitlist
            .iter()
            .any(|w| w.user_id == user_id && w.event_id == event_id);
        if exists {
            return Ok(false);
        }

        self.staged.next_waitlist_id += 1;
        let entry = WaitlistEntry {
            id: self.staged.next_waitlist_id,
            user_id,
            event_id,
            created_at: Utc::now(),
        };
        self.staged.waitlist.push(entry);
        Ok(true)
    }

    async fn delete_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<bool> {
        let before = self.staged.waitlist.len();
        self.staged
            .waitlist
            .retain(|w| !(w.user_id == user_id && w.event_id == event_id));
        Ok(self.staged.waitlist.len() < before)
    }

    async fn oldest_waitlist_entry(
        &mut self,
        event_id: i64,
    ) -> AdmissionResult<Option<WaitlistEntry>> {
        Ok(self
            .staged
            .waitlist_for_event(event_id)
            .first()
            .map(|w| (*w).clone()))
    }

    async fn advance_started(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64> {
        Ok(self.staged.advance_to(EventStatus::InProgress, now))
    }

    async fn advance_completed(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64> {
        Ok(self.staged.advance_to(EventStatus::Completed, now))
    }

    async fn commit(self: Box<Self>) -> AdmissionResult<()> {
        let MemoryLedgerTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::EventVisibility;
    use chrono::Duration;

    fn new_event(capacity: i32) -> NewEvent {
        let start = Utc::now() + Duration::days(1);
        NewEvent {
            title: "Ledger Test".into(),
            capacity,
            visibility: EventVisibility::Public,
            start_time: start,
            end_time: start + Duration::hours(2),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let ledger = InMemoryAdmissionLedger::new();
        let event = ledger.insert_event(new_event(2)).await.unwrap();
        let user = ledger.insert_user(NewUser::attendee("a@example.com")).await;

        {
            let mut tx = ledger.begin().await.unwrap();
            tx.insert_registration(user.id, event.id).await.unwrap();
            assert_eq!(tx.count_registered(event.id).await.unwrap(), 1);
        }

        let roster = ledger.roster(event.id).await.unwrap().unwrap();
        assert!(roster.registered.is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let ledger = InMemoryAdmissionLedger::new();
        let event = ledger.insert_event(new_event(2)).await.unwrap();
        let user = ledger.insert_user(NewUser::attendee("a@example.com")).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.insert_registration(user.id, event.id).await.unwrap();
        tx.commit().await.unwrap();

        let roster = ledger.roster(event.id).await.unwrap().unwrap();
        assert_eq!(roster.registered, vec![user.id]);
    }

    #[tokio::test]
    async fn test_waitlist_insert_is_idempotent_and_fifo() {
        let ledger = InMemoryAdmissionLedger::new();
        let event = ledger.insert_event(new_event(1)).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        assert!(tx.insert_waitlist_entry(3, event.id).await.unwrap());
        assert!(tx.insert_waitlist_entry(1, event.id).await.unwrap());
        assert!(!tx.insert_waitlist_entry(3, event.id).await.unwrap());

        let head = tx.oldest_waitlist_entry(event.id).await.unwrap().unwrap();
        assert_eq!(head.user_id, 3);
    }

    #[tokio::test]
    async fn test_invitations_ignore_case() {
        let ledger = InMemoryAdmissionLedger::new();
        let event = ledger.insert_event(new_event(1)).await.unwrap();
        ledger.invite(event.id, "Guest@Example.com").await;

        let mut tx = ledger.begin().await.unwrap();
        assert!(tx.has_invitation(event.id, "guest@example.COM").await.unwrap());
        assert!(!tx.has_invitation(event.id + 1, "guest@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_event_rejects_non_positive_capacity() {
        let ledger = InMemoryAdmissionLedger::new();

        for capacity in [0, -3] {
            let err = ledger.insert_event(new_event(capacity)).await.unwrap_err();
            assert_eq!(err.code(), "invalid_event");
        }
        assert!(ledger.event(1).await.is_none());
    }

    #[tokio::test]
    async fn test_insert_event_rejects_inverted_window() {
        let ledger = InMemoryAdmissionLedger::new();
        let mut inverted = new_event(5);
        std::mem::swap(&mut inverted.start_time, &mut inverted.end_time);

        let err = ledger.insert_event(inverted).await.unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidEvent(_)));

        let mut empty_window = new_event(5);
        empty_window.end_time = empty_window.start_time;
        assert!(ledger.insert_event(empty_window).await.is_err());
    }

    #[tokio::test]
    async fn test_check_in_requires_a_held_seat() {
        let ledger = InMemoryAdmissionLedger::new();
        let event = ledger.insert_event(new_event(1)).await.unwrap();
        let seated = ledger.insert_user(NewUser::attendee("seated@example.com")).await;
        let queued = ledger.insert_user(NewUser::attendee("queued@example.com")).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.insert_registration(seated.id, event.id).await.unwrap();
        tx.insert_waitlist_entry(queued.id, event.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(!ledger.mark_attended(queued.id, event.id).await);
        assert!(ledger.mark_attended(seated.id, event.id).await);
        assert!(!ledger.mark_attended(seated.id, event.id).await);

        let roster = ledger.roster(event.id).await.unwrap().unwrap();
        assert_eq!(roster.attended, vec![seated.id]);
        assert_eq!(roster.waitlist, vec![queued.id]);
    }
}
