//! `password_resets` table queries

use chrono::{DateTime, Utc};
use eartrain_common::models::PasswordReset;
use eartrain_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Store a reset token digest for `email`
pub async fn create_reset(
    pool: &SqlitePool,
    email: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO password_resets (email, token_hash, expires_at, used, created_at)
        VALUES (?, ?, ?, 0, ?)
        "#,
    )
    .bind(email)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Unused, unexpired reset matching `token_hash`
pub async fn find_usable(
    pool: &SqlitePool,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<PasswordReset>> {
    let reset = sqlx::query_as::<_, PasswordReset>(
        r#"
        SELECT id, email, token_hash, expires_at, used, created_at
        FROM password_resets
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(reset.filter(|r| r.is_usable(now)))
}

/// Mark a reset used and return its email
///
/// The conditional update makes the token single-use: of two concurrent
/// calls with the same token only one gets `Some`.
pub async fn consume(
    conn: &mut SqliteConnection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let email: Option<String> = sqlx::query_scalar(
        r#"
        UPDATE password_resets
        SET used = 1
        WHERE token_hash = ? AND used = 0 AND expires_at > ?
        RETURNING email
        "#,
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(email)
}

/// Invalidate every outstanding reset for `email`
pub async fn invalidate_for_email(conn: &mut SqliteConnection, email: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE password_resets SET used = 1 WHERE email = ? AND used = 0")
        .bind(email)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Delete expired resets; returns the number removed
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM password_resets WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
