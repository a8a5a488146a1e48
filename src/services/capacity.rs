use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::db::{jobs, StoreError};

/// Snapshot of the job queue as seen by dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: i64,
    pub in_progress: i64,
}

/// Read the current pending and in-progress counts.
pub async fn job_counts(pool: &PgPool) -> Result<JobCounts, StoreError> {
    let mut conn = pool.acquire().await?;
    let pending = jobs::get_number_of_pending(&mut conn).await?;
    let in_progress = jobs::get_number_of_in_progress(&mut conn).await?;

    Ok(JobCounts {
        pending,
        in_progress,
    })
}

/// Publish the current counts to the `jobs_pending` and `jobs_in_progress` gauges.
pub async fn refresh_job_gauges(pool: &PgPool) -> Result<JobCounts, StoreError> {
    let counts = job_counts(pool).await?;

    metrics::gauge!("jobs_pending").set(counts.pending as f64);
    metrics::gauge!("jobs_in_progress").set(counts.in_progress as f64);

    Ok(counts)
}

/// Refresh the job gauges every `interval` until the task is aborted.
pub fn spawn_gauge_refresher(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match refresh_job_gauges(&pool).await {
                Ok(counts) => tracing::debug!(
                    pending = counts.pending,
                    in_progress = counts.in_progress,
                    "Job gauges refreshed"
                ),
                Err(e) => tracing::error!(error = %e, "Failed to refresh job gauges"),
            }
        }
    })
}
