use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a processing job.
///
/// Stored as the Postgres `jobstatus` enum. A job starts `Pending`, is claimed into
/// `Processing`, and ends `Completed` or `Failed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "jobstatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    /// `Completed` and `Failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job currently in `self` may move to `next`.
    ///
    /// `Processing -> Pending` releases a claim whose compute task never started.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Pending)
        )
    }

    /// Statuses from which `self` is reachable in a single step.
    pub fn predecessors(self) -> Vec<JobStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(self))
            .collect()
    }
}

/// A processing job whose input lives at `s3://{s3_bucket}/{s3_key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub user_id: i64,
    pub s3_bucket: String,
    pub s3_key: String,
    pub fargate_task_arn: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::db::jobs::create`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewJob {
    #[garde(skip)]
    pub user_id: i64,

    #[garde(length(min = 3, max = 63))]
    pub s3_bucket: String,

    #[garde(length(min = 1, max = 1024))]
    pub s3_key: String,

    #[garde(skip)]
    #[serde(default = "default_status")]
    pub status: JobStatus,

    #[garde(length(min = 1))]
    #[serde(default)]
    pub fargate_task_arn: Option<String>,
}

fn default_status() -> JobStatus {
    JobStatus::Pending
}

impl NewJob {
    /// A pending job with no compute task attached.
    pub fn pending(user_id: i64, s3_bucket: impl Into<String>, s3_key: impl Into<String>) -> Self {
        Self {
            user_id,
            s3_bucket: s3_bucket.into(),
            s3_key: s3_key.into(),
            status: JobStatus::Pending,
            fargate_task_arn: None,
        }
    }
}
