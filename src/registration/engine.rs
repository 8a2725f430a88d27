//! # Registration Engine
//!
//! Register, cancel and waitlist promotion against the [`AdmissionLedger`].
//!
//! Each call is one ledger transaction. The event is locked first, so for a
//! given event the capacity check and the insert that depends on it (and the
//! select-delete-insert of a promotion) never interleave with another call.
//! Different events never contend.
//!
//! Notification intents are handed to the dispatcher only after commit. A
//! rolled-back or timed-out call emits nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use super::types::{CancelOutcome, RegisterResult};
use crate::config::EngineConfig;
use crate::constants::operations;
use crate::error::{AdmissionError, AdmissionResult};
use crate::ledger::{AdmissionLedger, EventRoster, LedgerTransaction};
use crate::logging::{log_admission_operation, log_admission_rejection};
use crate::models::Event;
use crate::notifications::{NotificationDispatcher, NotificationIntent, NotificationKind};
use crate::state_machine::{
    AdmissionEvent, AdmissionState, EventVisibility, StateMachineError,
};

/// A committed operation and the notifications it owes
struct Committed<T> {
    value: T,
    intents: Vec<NotificationIntent>,
}

impl<T> Committed<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            intents: Vec::new(),
        }
    }

    fn notify(mut self, intent: NotificationIntent) -> Self {
        self.intents.push(intent);
        self
    }
}

pub struct RegistrationEngine {
    ledger: Arc<dyn AdmissionLedger>,
    dispatcher: NotificationDispatcher,
    transaction_timeout: Duration,
}

impl std::fmt::Debug for RegistrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationEngine")
            .field("transaction_timeout", &self.transaction_timeout)
            .field("notifications", &self.dispatcher.stats())
            .finish()
    }
}

impl RegistrationEngine {
    pub fn new(
        ledger: Arc<dyn AdmissionLedger>,
        dispatcher: NotificationDispatcher,
        config: &EngineConfig,
    ) -> Self {
        Self {
            ledger,
            dispatcher,
            transaction_timeout: config.transaction_timeout(),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn AdmissionLedger> {
        &self.ledger
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Claim a seat, or a waitlist position when the event is full.
    ///
    /// A user already on the waitlist who registers again keeps their
    /// position (no second notification) unless a seat is free, in which
    /// case they are admitted directly.
    pub async fn register(&self, user_id: i64, event_id: i64) -> AdmissionResult<RegisterResult> {
        let span = info_span!(
            "admission",
            operation = operations::REGISTER,
            operation_id = %Uuid::new_v4(),
            user_id,
            event_id
        );

        let outcome = self
            .bounded(
                operations::REGISTER,
                self.register_in_transaction(user_id, event_id),
            )
            .instrument(span)
            .await;

        self.finish(operations::REGISTER, user_id, event_id, outcome, |result| {
            result.status.to_string()
        })
    }

    /// Give up a seat or a waitlist position. Releasing a seat promotes the
    /// oldest waitlisted user in the same transaction.
    pub async fn cancel(&self, user_id: i64, event_id: i64) -> AdmissionResult<CancelOutcome> {
        let span = info_span!(
            "admission",
            operation = operations::CANCEL,
            operation_id = %Uuid::new_v4(),
            user_id,
            event_id
        );

        let outcome = self
            .bounded(
                operations::CANCEL,
                self.cancel_in_transaction(user_id, event_id),
            )
            .instrument(span)
            .await;

        self.finish(operations::CANCEL, user_id, event_id, outcome, |outcome| {
            outcome.to_string()
        })
    }

    /// Current seats and queue for an event
    pub async fn roster(&self, event_id: i64) -> AdmissionResult<EventRoster> {
        self.bounded(operations::ROSTER, async {
            self.ledger
                .roster(event_id)
                .await?
                .ok_or(AdmissionError::EventNotFound { event_id })
        })
        .await
    }

    async fn register_in_transaction(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Committed<RegisterResult>> {
        let mut tx = self.ledger.begin().await?;

        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or(AdmissionError::EventNotFound { event_id })?;

        let registration = tx.find_registration(user_id, event_id).await?;
        if registration.is_some() {
            return Err(AdmissionError::AlreadyRegistered { user_id, event_id });
        }

        let user = tx
            .find_user(user_id)
            .await?
            .ok_or(AdmissionError::UserNotFound { user_id })?;

        if !event.status.admits_registrations() {
            return Err(AdmissionError::EventClosed {
                event_id,
                status: event.status.to_string(),
            });
        }

        if event.visibility == EventVisibility::Private
            && !tx.has_invitation(event_id, &user.email).await?
        {
            return Err(AdmissionError::NotInvited { user_id, event_id });
        }

        let waitlisted = tx.find_waitlist_entry(user_id, event_id).await?.is_some();
        let state = AdmissionState::from_records(registration, waitlisted);
        let registered = tx.count_registered(event_id).await?;

        if event.has_free_seat(registered) {
            state
                .apply(AdmissionEvent::Admit)
                .map_err(|e| rejection(e, user_id, event_id))?;

            if waitlisted {
                tx.delete_waitlist_entry(user_id, event_id).await?;
            }
            tx.insert_registration(user_id, event_id).await?;
            tx.commit().await?;

            let intent = intent_for(&user.email, user_id, &event, NotificationKind::Confirmed);
            return Ok(Committed::new(RegisterResult::registered()).notify(intent));
        }

        state
            .apply(AdmissionEvent::Enqueue)
            .map_err(|e| rejection(e, user_id, event_id))?;

        let queued = tx.insert_waitlist_entry(user_id, event_id).await?;
        tx.commit().await?;

        if queued {
            let intent = intent_for(&user.email, user_id, &event, NotificationKind::Waitlisted);
            Ok(Committed::new(RegisterResult::waitlisted()).notify(intent))
        } else {
            Ok(Committed::new(RegisterResult::already_waitlisted()))
        }
    }

    async fn cancel_in_transaction(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> AdmissionResult<Committed<CancelOutcome>> {
        let mut tx = self.ledger.begin().await?;

        let event = tx.lock_event(event_id).await?;
        let registration = tx.find_registration(user_id, event_id).await?;
        let waitlisted = tx.find_waitlist_entry(user_id, event_id).await?.is_some();

        let state = AdmissionState::from_records(registration, waitlisted);
        state
            .apply(AdmissionEvent::Withdraw)
            .map_err(|e| rejection(e, user_id, event_id))?;

        if !state.holds_seat() {
            tx.delete_waitlist_entry(user_id, event_id).await?;
            tx.commit().await?;
            return Ok(Committed::new(CancelOutcome::LeftWaitlist));
        }

        if !tx.delete_registration(user_id, event_id).await? {
            return Err(AdmissionError::RegistrationNotFound { user_id, event_id });
        }

        let promoted = match &event {
            Some(event) => promote_next(tx.as_mut(), event).await?,
            None => None,
        };

        tx.commit().await?;

        let mut committed = Committed::new(CancelOutcome::SeatReleased {
            promoted_user_id: promoted.as_ref().map(|p| p.user_id),
        });

        if let (Some(promoted), Some(event)) = (promoted, &event) {
            match promoted.email {
                Some(email) => {
                    committed = committed.notify(intent_for(
                        &email,
                        promoted.user_id,
                        event,
                        NotificationKind::Promoted,
                    ));
                }
                None => warn!(
                    user_id = promoted.user_id,
                    event_id, "Promoted user has no profile, skipping notification"
                ),
            }
        }

        Ok(committed)
    }

    async fn bounded<T, F>(&self, operation: &str, work: F) -> AdmissionResult<T>
    where
        F: Future<Output = AdmissionResult<T>>,
    {
        match tokio::time::timeout(self.transaction_timeout, work).await {
            Ok(result) => result,
            // The future (and its open transaction) is dropped here, rolling back
            Err(_) => Err(AdmissionError::TransactionTimeout {
                operation: operation.to_string(),
                timeout: self.transaction_timeout,
            }),
        }
    }

    /// Log the outcome and release notifications for committed work
    fn finish<T>(
        &self,
        operation: &str,
        user_id: i64,
        event_id: i64,
        outcome: AdmissionResult<Committed<T>>,
        describe: impl FnOnce(&T) -> String,
    ) -> AdmissionResult<T> {
        match outcome {
            Ok(committed) => {
                log_admission_operation(
                    operation,
                    user_id,
                    event_id,
                    &describe(&committed.value),
                    None,
                );
                for intent in committed.intents {
                    self.dispatcher.dispatch(intent);
                }
                Ok(committed.value)
            }
            Err(err) if err.is_domain() => {
                log_admission_rejection(operation, user_id, event_id, err.code());
                Err(err)
            }
            Err(err) => {
                error!(
                    operation = %operation,
                    user_id,
                    event_id,
                    error = %err,
                    "Admission operation failed"
                );
                Err(err)
            }
        }
    }
}

struct PromotedUser {
    user_id: i64,
    email: Option<String>,
}

/// Move the head of the waitlist into a free seat, if there is both
async fn promote_next(
    tx: &mut dyn LedgerTransaction,
    event: &Event,
) -> AdmissionResult<Option<PromotedUser>> {
    let registered = tx.count_registered(event.id).await?;
    if !event.has_free_seat(registered) {
        return Ok(None);
    }

    let Some(entry) = tx.oldest_waitlist_entry(event.id).await? else {
        return Ok(None);
    };

    let registration = tx.find_registration(entry.user_id, event.id).await?;
    AdmissionState::from_records(registration, true)
        .apply(AdmissionEvent::Promote)
        .map_err(|e| rejection(e, entry.user_id, event.id))?;

    tx.delete_waitlist_entry(entry.user_id, event.id).await?;
    tx.insert_registration(entry.user_id, event.id).await?;

    let email = tx.find_user(entry.user_id).await?.map(|u| u.email);

    tracing::info!(
        operation = operations::PROMOTE,
        user_id = entry.user_id,
        event_id = event.id,
        waitlisted_at = %entry.created_at,
        "Promoted from waitlist"
    );

    Ok(Some(PromotedUser {
        user_id: entry.user_id,
        email,
    }))
}

/// Translate a refused transition into the caller-facing rejection
fn rejection(err: StateMachineError, user_id: i64, event_id: i64) -> AdmissionError {
    let StateMachineError::InvalidTransition { from, event } = err;
    match (from, event) {
        (AdmissionState::Attended, AdmissionEvent::Withdraw) => {
            AdmissionError::AlreadyAttended { user_id, event_id }
        }
        (AdmissionState::None, AdmissionEvent::Withdraw) => {
            AdmissionError::RegistrationNotFound { user_id, event_id }
        }
        (AdmissionState::Registered | AdmissionState::Attended, _) => {
            AdmissionError::AlreadyRegistered { user_id, event_id }
        }
        (from, event) => AdmissionError::Storage(format!(
            "inconsistent admission state {from} on {} for user {user_id} event {event_id}",
            event.event_type()
        )),
    }
}

fn intent_for(
    email: &str,
    user_id: i64,
    event: &Event,
    kind: NotificationKind,
) -> NotificationIntent {
    NotificationIntent {
        recipient_email: email.to_string(),
        user_id,
        event_id: event.id,
        kind,
        event_title: event.title.clone(),
    }
}
