use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;

use admission_core::config::{AdmissionConfig, EngineConfig};
use admission_core::ledger::InMemoryAdmissionLedger;
use admission_core::models::{Event, NewEvent, NewUser, User};
use admission_core::notifications::{NotificationDispatcher, RecordingNotificationSink};
use admission_core::registration::RegistrationEngine;
use admission_core::state_machine::EventVisibility;

/// Engine wired to an in-memory ledger and a recording sink
pub struct TestHarness {
    pub ledger: Arc<InMemoryAdmissionLedger>,
    pub sink: Arc<RecordingNotificationSink>,
    pub engine: Arc<RegistrationEngine>,
    pub notification_worker: JoinHandle<()>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_parts(RecordingNotificationSink::new(), &EngineConfig::default())
    }

    pub fn with_engine_config(config: &EngineConfig) -> Self {
        Self::with_parts(RecordingNotificationSink::new(), config)
    }

    pub fn with_sink(sink: Arc<RecordingNotificationSink>) -> Self {
        Self::with_parts(sink, &EngineConfig::default())
    }

    fn with_parts(sink: Arc<RecordingNotificationSink>, config: &EngineConfig) -> Self {
        let ledger = Arc::new(InMemoryAdmissionLedger::new());
        let queue_capacity = AdmissionConfig::default().notifications.queue_capacity;
        let (dispatcher, notification_worker) =
            NotificationDispatcher::spawn(sink.clone(), queue_capacity);
        let engine = Arc::new(RegistrationEngine::new(ledger.clone(), dispatcher, config));

        Self {
            ledger,
            sink,
            engine,
            notification_worker,
        }
    }

    pub async fn event(&self, capacity: i32) -> Event {
        self.ledger
            .insert_event(upcoming_event("Rust Meetup", capacity))
            .await
            .expect("valid event")
    }

    pub async fn private_event(&self, capacity: i32) -> Event {
        let mut new_event = upcoming_event("Invite Only Dinner", capacity);
        new_event.visibility = EventVisibility::Private;
        self.ledger
            .insert_event(new_event)
            .await
            .expect("valid event")
    }

    pub async fn user(&self, email: &str) -> User {
        self.ledger.insert_user(NewUser::attendee(email)).await
    }

    pub async fn users(&self, count: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for i in 0..count {
            users.push(self.user(&format!("attendee{i}@example.com")).await);
        }
        users
    }
}

/// Public event starting tomorrow
pub fn upcoming_event(title: &str, capacity: i32) -> NewEvent {
    let start = Utc::now() + Duration::days(1);
    NewEvent {
        title: title.to_string(),
        capacity,
        visibility: EventVisibility::Public,
        start_time: start,
        end_time: start + Duration::hours(3),
    }
}

/// Public event whose window is `[start, end)` relative to now
pub fn event_in_window(title: &str, start: Duration, end: Duration) -> NewEvent {
    let now = Utc::now();
    NewEvent {
        title: title.to_string(),
        capacity: 10,
        visibility: EventVisibility::Public,
        start_time: now + start,
        end_time: now + end,
    }
}
