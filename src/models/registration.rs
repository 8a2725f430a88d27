//! # Registration Model
//!
//! One row per (user, event) pair holding a seat or marked as attended.
//! Only `REGISTERED` rows count against capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::state_machine::{AdmissionEvent, AdmissionState, RegistrationStatus};

const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    #[sqlx(try_from = "String")]
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub async fn find_for_pair(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let query = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1 AND event_id = $2"
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(conn)
            .await
    }

    /// Seats currently held for the event
    pub async fn count_registered(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'REGISTERED'",
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    pub async fn insert_registered(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Registration, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO registrations (user_id, event_id, status)
            VALUES ($1, $2, 'REGISTERED')
            RETURNING {REGISTRATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_one(conn)
            .await
    }

    /// Remove a seat. Attended rows are never touched.
    pub async fn delete_registered(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM registrations
            WHERE user_id = $1 AND event_id = $2 AND status = 'REGISTERED'
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check-in collaborator entry point. Returns false when the pair holds
    /// no seat to check in with.
    pub async fn mark_attended(
        pool: &PgPool,
        user_id: i64,
        event_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let current = Self::find_for_pair(&mut *tx, user_id, event_id).await?;
        let state = AdmissionState::from_records(current.map(|r| r.status), false);
        if state.apply(AdmissionEvent::CheckIn).is_err() {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'ATTENDED'
            WHERE user_id = $1 AND event_id = $2 AND status = 'REGISTERED'
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_event(
        pool: &PgPool,
        event_id: i64,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }
}
