//! Database initialization tests

use eartrain_common::db::init::init_database;
use eartrain_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use eartrain_common::db::{get_setting, load_jwt_secret, set_setting, DEFAULT_PROGRESSIONS};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("eartrain.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("eartrain.db")).await.unwrap();

    for table in [
        "schema_version",
        "settings",
        "users",
        "progress",
        "exercise_stats",
        "session_history",
        "user_badges",
        "password_resets",
        "chord_progressions",
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("eartrain.db");

    let pool = init_database(&db_path).await.unwrap();
    pool.close().await;
    let pool = init_database(&db_path).await.unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

    // seeding only happens on an empty catalog
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chord_progressions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count as usize, DEFAULT_PROGRESSIONS.len());
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("eartrain.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO user_badges (user_id, badge_id, unlocked_at) VALUES ('nobody', 'x', '2024-01-01')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "orphan badge row should be rejected");
}

#[tokio::test]
async fn test_jwt_secret_generated_once() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("eartrain.db")).await.unwrap();

    let first = load_jwt_secret(&pool).await.unwrap();
    let second = load_jwt_secret(&pool).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 96);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("eartrain.db")).await.unwrap();

    assert_eq!(get_setting(&pool, "missing").await.unwrap(), None);
    set_setting(&pool, "motd", "practice daily").await.unwrap();
    set_setting(&pool, "motd", "practice twice").await.unwrap();
    assert_eq!(
        get_setting(&pool, "motd").await.unwrap().as_deref(),
        Some("practice twice")
    );
}

#[tokio::test]
async fn test_fresh_database_stamped_with_baseline_only() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("eartrain.db")).await.unwrap();

    let versions: Vec<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(versions, vec![1]);
    assert_eq!(CURRENT_SCHEMA_VERSION, 1);

    // avatar is part of the baseline users table
    let has_avatar: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'avatar'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(has_avatar, 1);
}
