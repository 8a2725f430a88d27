//! # Waitlist Entry Model
//!
//! FIFO queue of users waiting for a seat. Order is `created_at` with the
//! `BIGSERIAL` id breaking ties between entries created in the same instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

const WAITLIST_COLUMNS: &str = "id, user_id, event_id, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WaitlistEntry {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub async fn find_for_pair(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE user_id = $1 AND event_id = $2"
        );

        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(conn)
            .await
    }

    /// Append to the queue. Returns false when the pair is already queued.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO waitlist (user_id, event_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, event_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_pair(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM waitlist WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Head of the queue for the event
    pub async fn oldest_for_event(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {WAITLIST_COLUMNS} FROM waitlist
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#
        );

        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(event_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_for_event(
        pool: &PgPool,
        event_id: i64,
    ) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {WAITLIST_COLUMNS} FROM waitlist
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        );

        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }
}
