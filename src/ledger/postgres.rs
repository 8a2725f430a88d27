//! PostgreSQL ledger backed by the tables in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::{AdmissionLedger, EventRoster, LedgerTransaction};
use crate::error::AdmissionResult;
use crate::models::{Event, Invitation, Registration, User, WaitlistEntry};
use crate::state_machine::RegistrationStatus;

#[derive(Debug, Clone)]
pub struct PgAdmissionLedger {
    pool: PgPool,
}

impl PgAdmissionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AdmissionLedger for PgAdmissionLedger {
    async fn begin(&self) -> AdmissionResult<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn roster(&self, event_id: i64) -> AdmissionResult<Option<EventRoster>> {
        let Some(event) = Event::find_by_id(&self.pool, event_id).await? else {
            return Ok(None);
        };

        let registrations = Registration::list_for_event(&self.pool, event_id).await?;
        let waitlist = WaitlistEntry::list_for_event(&self.pool, event_id).await?;

        let (attended, registered): (Vec<_>, Vec<_>) = registrations
            .into_iter()
            .partition(|r| r.status == RegistrationStatus::Attended);

        Ok(Some(EventRoster {
            event_id,
            capacity: event.capacity,
            status: event.status,
            registered: registered.into_iter().map(|r| r.user_id).collect(),
            attended: attended.into_iter().map(|r| r.user_id).collect(),
            waitlist: waitlist.into_iter().map(|w| w.user_id).collect(),
        }))
    }
}

/// Open database transaction; rolls back when dropped uncommitted
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_event(&mut self, event_id: i64) -> AdmissionResult<Option<Event>> {
        Ok(Event::lock_for_update(&mut self.tx, event_id).await?)
    }

    async fn find_user(&mut self, user_id: i64) -> AdmissionResult<Option<User>> {
        Ok(User::find_by_id(&mut self.tx, user_id).await?)
    }

    async fn find_registration(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<RegistrationStatus>> {
        let registration = Registration::find_for_pair(&mut self.tx, user_id, event_id).await?;
        Ok(registration.map(|r| r.status))
    }

    async fn find_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Option<WaitlistEntry>> {
        Ok(WaitlistEntry::find_for_pair(&mut self.tx, user_id, event_id).await?)
    }

    async fn has_invitation(&mut self, event_id: i64, email: &str) -> AdmissionResult<bool> {
        Ok(Invitation::exists(&mut self.tx, event_id, email).await?)
    }

    async fn count_registered(&mut self, event_id: i64) -> AdmissionResult<i64> {
        Ok(Registration::count_registered(&mut self.tx, event_id).await?)
    }

    async fn insert_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<()> {
        Registration::insert_registered(&mut self.tx, user_id, event_id).await?;
        Ok(())
    }

    async fn delete_registration(&mut self, user_id: i64, event_id: i64) -> AdmissionResult<bool> {
        Ok(Registration::delete_registered(&mut self.tx, user_id, event_id).await?)
    }

    async fn insert_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<bool> {
        Ok(WaitlistEntry::insert_if_absent(&mut self.tx, user_id, event_id).await?)
    }

    async fn delete_waitlist_entry(
        &mut self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<bool> {
        Ok(WaitlistEntry::delete_for_pair(&mut self.tx, user_id, event_id).await?)
    }

    async fn oldest_waitlist_entry(
        &mut self,
        event_id: i64,
    ) -> AdmissionResult<Option<WaitlistEntry>> {
        Ok(WaitlistEntry::oldest_for_event(&mut self.tx, event_id).await?)
    }

    async fn advance_started(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64> {
        Ok(Event::advance_started(&mut self.tx, now).await?)
    }

    async fn advance_completed(&mut self, now: DateTime<Utc>) -> AdmissionResult<u64> {
        Ok(Event::advance_completed(&mut self.tx, now).await?)
    }

    async fn commit(self: Box<Self>) -> AdmissionResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
