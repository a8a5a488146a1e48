use garde::Validate;
use sqlx::PgConnection;

use super::error::StoreError;
use crate::models::user::{NewUser, User};

/// Insert a user. A duplicate `cognito_id` fails with a unique violation.
pub async fn create(conn: &mut PgConnection, new_user: &NewUser) -> Result<User, StoreError> {
    new_user.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (cognito_id, email, "timestamp")
        VALUES ($1, $2, NOW())
        RETURNING id, cognito_id, email, "timestamp"
        "#,
    )
    .bind(&new_user.cognito_id)
    .bind(&new_user.email)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(user_id = user.id, cognito_id = %user.cognito_id, "User created");

    Ok(user)
}

pub async fn get_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, cognito_id, email, "timestamp"
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

/// Look up the user behind an identity-provider subject.
pub async fn get_by_cognito_id(
    conn: &mut PgConnection,
    cognito_id: &str,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, cognito_id, email, "timestamp"
        FROM users
        WHERE cognito_id = $1
        "#,
    )
    .bind(cognito_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

/// Delete a user. Returns `false` if no such user exists.
///
/// Jobs are never removed implicitly: a user that still owns jobs cannot be
/// deleted and the call fails with a foreign-key violation.
pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(user_id = id, "User deleted");
    }

    Ok(deleted)
}
