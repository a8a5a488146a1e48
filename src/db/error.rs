use sqlx::error::ErrorKind;
use uuid::Uuid;

use crate::models::job::JobStatus;

/// Errors returned by the job and user accessors.
///
/// Constraint violations raised by Postgres are carried unmodified in
/// [`StoreError::Database`]; use the `is_*_violation` helpers to classify them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] garde::Report),

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job {id} is {status}, not PROCESSING")]
    NotProcessing { id: Uuid, status: JobStatus },

    #[error("Empty compute task ARN for job {0}")]
    MissingTaskArn(Uuid),
}

impl StoreError {
    fn database_kind(&self) -> Option<ErrorKind> {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => Some(db.kind()),
            _ => None,
        }
    }

    /// True for a duplicate key, e.g. a second user with the same `cognito_id`.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.database_kind(), Some(ErrorKind::UniqueViolation))
    }

    /// True when a job references a missing user, or a user with jobs is deleted.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.database_kind(), Some(ErrorKind::ForeignKeyViolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = StoreError::NotFound(Uuid::nil());
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());

        let err = StoreError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = StoreError::InvalidTransition {
            id: Uuid::nil(),
            from: JobStatus::Completed,
            to: JobStatus::Processing,
        };
        assert_eq!(
            err.to_string(),
            "Job 00000000-0000-0000-0000-000000000000 cannot move from COMPLETED to PROCESSING"
        );
    }
}
