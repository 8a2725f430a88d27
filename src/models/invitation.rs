//! # Invitation Model
//!
//! Guest list for private events, keyed by lowercased e-mail address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub event_id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Invite one address. Re-inviting is a no-op.
    pub async fn create(pool: &PgPool, event_id: i64, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO invitations (event_id, email)
            VALUES ($1, LOWER($2))
            ON CONFLICT (event_id, email) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(email)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Invite many addresses atomically, returning how many were new
    pub async fn bulk_invite(
        pool: &PgPool,
        event_id: i64,
        emails: &[String],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for email in emails {
            let result = sqlx::query(
                r#"
                INSERT INTO invitations (event_id, email)
                VALUES ($1, LOWER($2))
                ON CONFLICT (event_id, email) DO NOTHING
                "#,
            )
            .bind(event_id)
            .bind(email)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn exists(
        conn: &mut PgConnection,
        event_id: i64,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM invitations WHERE event_id = $1 AND email = LOWER($2))",
        )
        .bind(event_id)
        .bind(email)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_event(
        pool: &PgPool,
        event_id: i64,
    ) -> Result<Vec<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            "SELECT event_id, email, created_at FROM invitations WHERE event_id = $1 ORDER BY email",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
