//! User persistence. Raw SQL against the `users` table, timestamps rendered
//! server-side so responses always carry UTC RFC 3339 strings.

use super::types::UserResponse;
use anyhow::Result;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};

const USER_COLUMNS: &str = r#"id, username, password_hash, email,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at"#;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug)]
pub enum SignupOutcome {
    Created(UserRecord),
    UsernameTaken,
}

#[derive(Debug)]
pub enum EmailUpdateOutcome {
    Updated(UserRecord),
    EmailTaken,
    NotFound,
}

fn row_to_user(row: &PgRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

/// Find a user by username
/// # Errors
/// Returns an error if the query fails
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query,
    );

    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(query_span)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Find a user by primary key
/// # Errors
/// Returns an error if the query fails
pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query,
    );

    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(query_span)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Check whether a username is already registered
/// # Errors
/// Returns an error if the query fails
pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)";

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query,
    );

    let taken: bool = sqlx::query_scalar(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(query_span)
        .await?;

    Ok(taken)
}

/// Check whether an email is already attached to any account
/// # Errors
/// Returns an error if the query fails
pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)";

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query,
    );

    let taken: bool = sqlx::query_scalar(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(query_span)
        .await?;

    Ok(taken)
}

/// Insert a new user. A concurrent duplicate username surfaces as
/// `SignupOutcome::UsernameTaken` via the unique constraint, never as an error.
/// # Errors
/// Returns an error if the query fails
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<SignupOutcome> {
    let query =
        format!("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}");

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query,
    );

    match sqlx::query(&query)
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(query_span)
        .await
    {
        Ok(row) => Ok(SignupOutcome::Created(row_to_user(&row)?)),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::UsernameTaken),
        Err(err) => Err(err.into()),
    }
}

/// Replace a user's password hash
/// # Errors
/// Returns an error if the query fails
pub async fn update_password(
    pool: &PgPool,
    user_id: i64,
    password_hash: &str,
) -> Result<Option<UserRecord>> {
    let query =
        format!("UPDATE users SET password_hash = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query,
    );

    let row = sqlx::query(&query)
        .bind(user_id)
        .bind(password_hash)
        .fetch_optional(pool)
        .instrument(query_span)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Attach a verified email to a user. A concurrent claim of the same email
/// surfaces as `EmailUpdateOutcome::EmailTaken` via the unique constraint.
/// # Errors
/// Returns an error if the query fails
pub async fn update_email(pool: &PgPool, user_id: i64, email: &str) -> Result<EmailUpdateOutcome> {
    let query = format!("UPDATE users SET email = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query,
    );

    match sqlx::query(&query)
        .bind(user_id)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span)
        .await
    {
        Ok(Some(row)) => Ok(EmailUpdateOutcome::Updated(row_to_user(&row)?)),
        Ok(None) => Ok(EmailUpdateOutcome::NotFound),
        Err(err) if is_unique_violation(&err) => Ok(EmailUpdateOutcome::EmailTaken),
        Err(err) => Err(err.into()),
    }
}

/// Delete a user, returning whether a row was removed
/// # Errors
/// Returns an error if the query fails
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";

    let query_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = %query,
    );

    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_excludes_password_hash() {
        let user = UserRecord {
            id: 7,
            username: "alice".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            email: Some("alice@example.com".to_string()),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_value(&response).expect("serialize");

        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password_hash").is_none());
    }
}
