//! # User Model
//!
//! Users are synced from the identity provider on first login; the admission
//! engine only reads them. `subject` is the provider's stable identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

const USER_COLUMNS: &str = "id, email, subject, role, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub subject: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub subject: Option<String>,
    pub role: String,
}

impl NewUser {
    pub fn attendee(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            subject: None,
            role: "ATTENDEE".to_string(),
        }
    }
}

impl User {
    pub async fn create(pool: &PgPool, new_user: NewUser) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, subject, role)
            VALUES (LOWER($1), $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(new_user.email)
            .bind(new_user.subject)
            .bind(new_user.role)
            .fetch_one(pool)
            .await
    }

    /// Find a user inside an open transaction
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_subject(
        pool: &PgPool,
        subject: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE subject = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(subject)
            .fetch_optional(pool)
            .await
    }
}
