use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub mod error;
pub mod jobs;
pub mod users;

pub use error::StoreError;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Undo every applied migration, dropping the jobs and users tables and the
/// `jobstatus` type.
pub async fn revert_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .undo(pool, 0)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}
