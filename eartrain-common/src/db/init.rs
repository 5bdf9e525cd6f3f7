//! Database initialization
//!
//! Opens (creating if needed) the SQLite file, applies connection pragmas,
//! creates every table idempotently, runs migrations and seeds the default
//! chord-progression catalog.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Milliseconds a connection waits on a locked database before failing
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;
    crate::db::seed::seed_chord_progressions(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_progress_table(pool).await?;
    create_exercise_stats_table(pool).await?;
    create_session_history_table(pool).await?;
    create_user_badges_table(pool).await?;
    create_password_resets_table(pool).await?;
    create_chord_progressions_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            google_id TEXT UNIQUE,
            name TEXT NOT NULL,
            subscription TEXT NOT NULL DEFAULT 'free'
                CHECK (subscription IN ('free', 'premium', 'pro')),
            level INTEGER NOT NULL DEFAULT 1,
            xp INTEGER NOT NULL DEFAULT 0,
            avatar TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_active TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS progress (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
            current_level INTEGER NOT NULL DEFAULT 1 CHECK (current_level >= 1),
            total_points INTEGER NOT NULL DEFAULT 0,
            total_sessions INTEGER NOT NULL DEFAULT 0,
            total_correct INTEGER NOT NULL DEFAULT 0,
            total_questions INTEGER NOT NULL DEFAULT 0,
            accuracy REAL NOT NULL DEFAULT 0,
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            last_activity_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_progress_total_xp ON progress(total_xp DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_exercise_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exercise_stats (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            exercise_type TEXT NOT NULL,
            sessions INTEGER NOT NULL DEFAULT 0,
            correct INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL DEFAULT 0,
            best_score INTEGER NOT NULL DEFAULT 0,
            xp_earned INTEGER NOT NULL DEFAULT 0,
            last_played_at TEXT NOT NULL,
            PRIMARY KEY (user_id, exercise_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_session_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session_history (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            exercise_type TEXT NOT NULL,
            score INTEGER NOT NULL,
            correct INTEGER NOT NULL,
            total INTEGER NOT NULL,
            xp_earned INTEGER NOT NULL,
            duration_secs INTEGER NOT NULL,
            completed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_session_history_user \
         ON session_history(user_id, completed_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_badges_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_badges (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            badge_id TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            PRIMARY KEY (user_id, badge_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_password_resets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS password_resets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            token_hash TEXT NOT NULL UNIQUE,
            expires_at TEXT NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_password_resets_expires ON password_resets(expires_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chord_progressions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chord_progressions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            degrees TEXT NOT NULL,
            difficulty TEXT NOT NULL
                CHECK (difficulty IN ('beginner', 'intermediate', 'advanced')),
            category TEXT NOT NULL,
            mode TEXT NOT NULL DEFAULT 'major' CHECK (mode IN ('major', 'minor')),
            tempo INTEGER NOT NULL DEFAULT 100 CHECK (tempo BETWEEN 40 AND 240),
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
