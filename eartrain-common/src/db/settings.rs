//! Key/value settings table

use crate::Result;
use rand::RngCore;
use sqlx::SqlitePool;
use tracing::info;

/// Settings key holding the generated token-signing secret
pub const JWT_SECRET_KEY: &str = "jwt_secret";

/// Read a setting, `None` when absent or NULL
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

/// Insert or replace a setting
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

    Ok(())
}

/// Load the token-signing secret, generating and storing one on first use
///
/// The stored secret survives restarts so issued tokens stay valid. A
/// concurrent first start keeps whichever secret was written first.
pub async fn load_jwt_secret(pool: &SqlitePool) -> Result<String> {
    if let Some(secret) = get_setting(pool, JWT_SECRET_KEY).await? {
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    let mut bytes = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut bytes);
    let generated: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value \
         WHERE settings.value IS NULL OR settings.value = ''",
    )
    .bind(JWT_SECRET_KEY)
    .bind(&generated)
    .execute(pool)
    .await?;

    info!("Generated new token signing secret");

    let stored = get_setting(pool, JWT_SECRET_KEY).await?;
    Ok(stored.unwrap_or(generated))
}
