//! # Database Layer
//!
//! Connection pooling and schema migrations for the admission ledger.

pub mod connection;

pub use connection::DatabaseConnection;

/// Embedded migrations for `#[sqlx::test(migrator = "...")]` and startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
