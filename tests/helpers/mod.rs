//! Shared setup for database integration tests
//!
//! Tests read `DATABASE_URL` through `AppConfig` and expect a disposable
//! PostgreSQL database. Run with:
//! `cargo test --test integration_test -- --ignored`

#![allow(dead_code)]

use job_tracker::{
    config::AppConfig,
    db::{self, users},
    models::user::{NewUser, User},
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Serializes tests that observe the whole `jobs` table.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub async fn serial() -> MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

/// Connect to the test database and apply migrations.
pub async fn test_pool() -> PgPool {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let config = AppConfig::from_env().expect("Failed to load config");

    let pool = db::init_pool(&config.database_url, 10)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Open a transaction that sees an empty `jobs` table. Dropping it rolls back.
pub async fn begin_clean(pool: &PgPool) -> Transaction<'static, Postgres> {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    sqlx::query("DELETE FROM jobs")
        .execute(&mut *tx)
        .await
        .expect("Failed to clear jobs");

    tx
}

/// Create a user with a unique Cognito subject.
pub async fn create_user(conn: &mut PgConnection) -> User {
    let cognito_id = format!("test-{}", Uuid::new_v4());

    users::create(
        conn,
        &NewUser {
            email: format!("{cognito_id}@example.com"),
            cognito_id,
        },
    )
    .await
    .expect("Failed to create user")
}
