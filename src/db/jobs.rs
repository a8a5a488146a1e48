//! Accessors for the `jobs` table.
//!
//! Every function runs on a caller-supplied connection, so it participates in
//! whatever transaction the caller has open (`&mut *tx`). Statements execute
//! immediately and their effects are visible to later statements on the same
//! connection.

use chrono::Utc;
use garde::Validate;
use sqlx::PgConnection;
use uuid::Uuid;

use super::error::StoreError;
use crate::models::job::{Job, JobStatus, NewJob};

/// Insert a new job with a fresh id; both timestamps are set to the same instant.
pub async fn create(conn: &mut PgConnection, new_job: &NewJob) -> Result<Job, StoreError> {
    new_job.validate()?;

    let now = Utc::now();
    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_job.user_id)
    .bind(&new_job.s3_bucket)
    .bind(&new_job.s3_key)
    .bind(new_job.fargate_task_arn.as_deref())
    .bind(new_job.status)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    metrics::counter!("jobs_created_total").increment(1);
    tracing::info!(
        job_id = %job.id,
        user_id = job.user_id,
        status = %job.status,
        s3_bucket = %job.s3_bucket,
        s3_key = %job.s3_key,
        "Job created"
    );

    Ok(job)
}

/// Get a job by ID
pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Job>, StoreError> {
    let job = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        FROM jobs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(job)
}

/// All jobs currently `PROCESSING`, oldest first.
pub async fn get_all_in_progress(conn: &mut PgConnection) -> Result<Vec<Job>, StoreError> {
    let jobs = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        FROM jobs
        WHERE status = 'PROCESSING'
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(jobs)
}

/// Number of `PROCESSING` jobs, used by dispatchers as a capacity gauge.
pub async fn get_number_of_in_progress(conn: &mut PgConnection) -> Result<i64, StoreError> {
    count_with_status(conn, JobStatus::Processing).await
}

/// Number of `PENDING` jobs waiting to be claimed.
pub async fn get_number_of_pending(conn: &mut PgConnection) -> Result<i64, StoreError> {
    count_with_status(conn, JobStatus::Pending).await
}

async fn count_with_status(conn: &mut PgConnection, status: JobStatus) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = $1")
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// Peek at the oldest `PENDING` job without locking it.
///
/// Two callers may see the same job; use [`claim_next_pending`] to take ownership.
pub async fn get_next_pending(conn: &mut PgConnection) -> Result<Option<Job>, StoreError> {
    let job = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        FROM jobs
        WHERE status = 'PENDING'
        ORDER BY created_at ASC, id ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(job)
}

/// Atomically move the oldest `PENDING` job to `PROCESSING` and return it.
///
/// Rows locked by a concurrent claim are skipped, so a job is handed to at most
/// one caller. Returns `None` when nothing is pending.
pub async fn claim_next_pending(
    conn: &mut PgConnection,
    fargate_task_arn: Option<&str>,
) -> Result<Option<Job>, StoreError> {
    let fargate_task_arn = fargate_task_arn.filter(|arn| !arn.is_empty());

    let job = sqlx::query_as::<_, Job>(
        r#"
        WITH next_job AS (
            SELECT id
            FROM jobs
            WHERE status = 'PENDING'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE jobs
        SET status = 'PROCESSING',
            fargate_task_arn = COALESCE($1, jobs.fargate_task_arn),
            updated_at = GREATEST(jobs.updated_at, $2)
        FROM next_job
        WHERE jobs.id = next_job.id
        RETURNING jobs.id, jobs.user_id, jobs.s3_bucket, jobs.s3_key, jobs.fargate_task_arn,
                  jobs.status, jobs.created_at, jobs.updated_at
        "#,
    )
    .bind(fargate_task_arn)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(job) = &job {
        metrics::counter!("jobs_claimed_total").increment(1);
        record_transition(JobStatus::Processing);
        tracing::info!(job_id = %job.id, user_id = job.user_id, "Job claimed");
    } else {
        tracing::trace!("No pending job to claim");
    }

    Ok(job)
}

/// Count an accepted transition, whether it came from a claim or `update_status`.
fn record_transition(to: JobStatus) {
    metrics::counter!("job_transitions_total", "to" => to.to_string()).increment(1);
}

/// Move a job to `status`, rejecting transitions the lifecycle does not allow.
///
/// The check and the write are a single conditional `UPDATE`. A provided, non-empty
/// `fargate_task_arn` replaces the stored one; releasing a job back to `PENDING`
/// clears it. `updated_at` never moves backwards.
pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: JobStatus,
    fargate_task_arn: Option<&str>,
) -> Result<Job, StoreError> {
    let fargate_task_arn = fargate_task_arn.filter(|arn| !arn.is_empty());
    let allowed_from: Vec<String> = status
        .predecessors()
        .into_iter()
        .map(|from| from.to_string())
        .collect();

    let updated = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET status = $2,
            updated_at = GREATEST(updated_at, $3),
            fargate_task_arn = CASE
                WHEN $2 = 'PENDING'::jobstatus THEN NULL
                ELSE COALESCE($4, fargate_task_arn)
            END
        WHERE id = $1
          AND status::text = ANY($5)
        RETURNING id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(Utc::now())
    .bind(fargate_task_arn)
    .bind(allowed_from)
    .fetch_optional(&mut *conn)
    .await?;

    match updated {
        Some(job) => {
            record_transition(status);
            tracing::info!(
                job_id = %job.id,
                status = %job.status,
                fargate_task_arn = job.fargate_task_arn.as_deref().unwrap_or(""),
                "Job status updated"
            );
            Ok(job)
        }
        None => match get_by_id(conn, id).await? {
            Some(current) => {
                tracing::warn!(
                    job_id = %id,
                    from = %current.status,
                    to = %status,
                    "Rejected job status transition"
                );
                Err(StoreError::InvalidTransition {
                    id,
                    from: current.status,
                    to: status,
                })
            }
            None => Err(StoreError::NotFound(id)),
        },
    }
}

/// Record the compute task handling a job that is already `PROCESSING`.
pub async fn attach_task_arn(
    conn: &mut PgConnection,
    id: Uuid,
    fargate_task_arn: &str,
) -> Result<Job, StoreError> {
    if fargate_task_arn.is_empty() {
        return Err(StoreError::MissingTaskArn(id));
    }

    let updated = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET fargate_task_arn = $2,
            updated_at = GREATEST(updated_at, $3)
        WHERE id = $1
          AND status = 'PROCESSING'
        RETURNING id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(fargate_task_arn)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    match updated {
        Some(job) => {
            tracing::info!(job_id = %job.id, fargate_task_arn, "Compute task attached");
            Ok(job)
        }
        None => match get_by_id(conn, id).await? {
            Some(current) => Err(StoreError::NotProcessing {
                id,
                status: current.status,
            }),
            None => Err(StoreError::NotFound(id)),
        },
    }
}

/// All jobs owned by a user, oldest first.
pub async fn get_jobs_by_user_id(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<Vec<Job>, StoreError> {
    let jobs = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, user_id, s3_bucket, s3_key, fargate_task_arn, status, created_at, updated_at
        FROM jobs
        WHERE user_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(jobs)
}
