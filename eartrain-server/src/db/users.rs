//! `users` table queries

use chrono::{DateTime, Utc};
use eartrain_common::models::{SubscriptionTier, User};
use eartrain_common::{uuid_utils, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};

use super::progress::ensure_progress;

const USER_COLUMNS: &str = "id, email, password_hash, google_id, name, subscription, \
                            level, xp, avatar, created_at, updated_at, last_active";

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already normalized
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub avatar: Option<String>,
}

/// Insert a user and their empty progress row in one transaction
///
/// A duplicate email or Google id yields [`Error::Conflict`].
pub async fn create_user(
    pool: &SqlitePool,
    new_user: NewUser,
    now: DateTime<Utc>,
) -> Result<User> {
    let user = User {
        id: uuid_utils::new_id(),
        email: new_user.email,
        password_hash: new_user.password_hash,
        google_id: new_user.google_id,
        name: new_user.name,
        subscription: SubscriptionTier::default(),
        level: 1,
        xp: 0,
        avatar: new_user.avatar,
        created_at: now,
        updated_at: now,
        last_active: Some(now),
    };

    let mut tx = pool.begin().await?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO users
            (id, email, password_hash, google_id, name, subscription,
             level, xp, avatar, created_at, updated_at, last_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.google_id)
    .bind(&user.name)
    .bind(user.subscription)
    .bind(user.level)
    .bind(user.xp)
    .bind(&user.avatar)
    .bind(user.created_at)
    .bind(user.updated_at)
    .bind(user.last_active)
    .execute(&mut *tx)
    .await;

    if let Err(err) = inserted {
        let err = Error::from(err);
        if err.is_unique_violation() {
            return Err(Error::Conflict("Email already registered".to_string()));
        }
        return Err(err);
    }

    ensure_progress(&mut tx, &user.id, now).await?;
    tx.commit().await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

/// Lookup by email; `email` must already be normalized
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn find_by_google_id(pool: &SqlitePool, google_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE google_id = ?",
        USER_COLUMNS
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Record a sign-in
pub async fn touch_last_active(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE users SET last_active = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Attach a Google account to an existing user
///
/// Keeps an existing avatar; only fills it when empty.
pub async fn link_google(
    pool: &SqlitePool,
    id: &str,
    google_id: &str,
    avatar: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET google_id = ?, avatar = COALESCE(avatar, ?), updated_at = ?, last_active = ?
        WHERE id = ?
        "#,
    )
    .bind(google_id)
    .bind(avatar)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the password hash of the account with `email`
///
/// Returns false when no such account exists.
pub async fn set_password_by_email(
    conn: &mut SqliteConnection,
    email: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE email = ?")
        .bind(password_hash)
        .bind(now)
        .bind(email)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store the level/xp snapshot carried in issued tokens
pub async fn update_level_snapshot(
    conn: &mut SqliteConnection,
    id: &str,
    level: i64,
    xp: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE users SET level = ?, xp = ?, updated_at = ?, last_active = ? WHERE id = ?")
        .bind(level)
        .bind(xp)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of users, newest first
pub async fn list_users(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(users)
}
