//! # Event Model
//!
//! The capacity-bearing resource. Created and edited by the event-management
//! collaborator; the lifecycle scheduler is the only writer of `status`
//! besides the organizer's explicit cancellation.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE events (
//!   id BIGSERIAL PRIMARY KEY,
//!   title TEXT NOT NULL,
//!   capacity INTEGER NOT NULL CHECK (capacity > 0),
//!   visibility TEXT NOT NULL DEFAULT 'PUBLIC',
//!   status TEXT NOT NULL DEFAULT 'UPCOMING',
//!   start_time TIMESTAMPTZ NOT NULL,
//!   end_time TIMESTAMPTZ NOT NULL,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{AdmissionError, AdmissionResult};
use crate::state_machine::{EventStatus, EventVisibility};

const EVENT_COLUMNS: &str =
    "id, title, capacity, visibility, status, start_time, end_time, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub capacity: i32,
    #[sqlx(try_from = "String")]
    pub visibility: EventVisibility,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Event for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub capacity: i32,
    pub visibility: EventVisibility,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewEvent {
    /// Mirror of the `events` table checks: a positive capacity and a window
    /// that ends after it starts
    pub fn validate(&self) -> AdmissionResult<()> {
        if self.capacity <= 0 {
            return Err(AdmissionError::InvalidEvent(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }
        if self.end_time <= self.start_time {
            return Err(AdmissionError::InvalidEvent(
                "end_time must be after start_time".to_string(),
            ));
        }
        Ok(())
    }
}

impl Event {
    /// Whether a further registration still fits under the cap
    pub fn has_free_seat(&self, registered: i64) -> bool {
        registered < i64::from(self.capacity)
    }

    /// Create a new event in `UPCOMING` status
    pub async fn create(pool: &PgPool, new_event: NewEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO events (title, capacity, visibility, status, start_time, end_time)
            VALUES ($1, $2, $3, 'UPCOMING', $4, $5)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(new_event.title)
            .bind(new_event.capacity)
            .bind(new_event.visibility.as_str())
            .bind(new_event.start_time)
            .bind(new_event.end_time)
            .fetch_one(pool)
            .await
    }

    /// Find an event by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load and lock the event row for the rest of the transaction.
    ///
    /// Every register and cancel takes this lock first, so the
    /// count-then-insert and the promotion sequence are serialized per event.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Organizer override; the scheduler never reverts it
    pub async fn cancel(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Advance events whose start time has passed but end time has not
    pub async fn advance_started(
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = 'IN_PROGRESS', updated_at = $1
            WHERE status = 'UPCOMING' AND start_time <= $1 AND end_time > $1
            "#,
        )
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Advance events whose end time has passed
    pub async fn advance_completed(
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = 'COMPLETED', updated_at = $1
            WHERE status IN ('UPCOMING', 'IN_PROGRESS') AND end_time <= $1
            "#,
        )
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_has_free_seat() {
        let now = Utc::now();
        let event = Event {
            id: 1,
            title: "Rust Meetup".into(),
            capacity: 2,
            visibility: EventVisibility::Public,
            status: EventStatus::Upcoming,
            start_time: now + Duration::hours(1),
            end_time: now + Duration::hours(2),
            created_at: now,
            updated_at: now,
        };

        assert!(event.has_free_seat(0));
        assert!(event.has_free_seat(1));
        assert!(!event.has_free_seat(2));
        assert!(!event.has_free_seat(3));
    }

    #[test]
    fn test_new_event_validation() {
        let start = Utc::now() + Duration::days(1);
        let valid = NewEvent {
            title: "Rust Meetup".into(),
            capacity: 1,
            visibility: EventVisibility::Public,
            start_time: start,
            end_time: start + Duration::hours(1),
        };
        assert!(valid.validate().is_ok());

        let no_seats = NewEvent {
            capacity: 0,
            ..valid.clone()
        };
        assert!(matches!(
            no_seats.validate(),
            Err(AdmissionError::InvalidEvent(_))
        ));

        let backwards = NewEvent {
            end_time: start - Duration::hours(1),
            ..valid
        };
        assert!(matches!(
            backwards.validate(),
            Err(AdmissionError::InvalidEvent(_))
        ));
    }
}
