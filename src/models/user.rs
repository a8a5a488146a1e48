use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// An account that owns jobs, keyed externally by its Cognito subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub cognito_id: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

/// Input for [`crate::db::users::create`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[garde(length(min = 1, max = 128))]
    pub cognito_id: String,

    #[garde(email)]
    pub email: String,
}
