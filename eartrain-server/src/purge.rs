//! Background removal of expired password-reset rows

use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::password_resets;

/// Delete expired resets every `interval` until `shutdown` flips to true
pub fn spawn_purge_task(
    db: SqlitePool,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match password_resets::purge_expired(&db, eartrain_common::time::now()).await {
                        Ok(0) => {}
                        Ok(removed) => debug!("Purged {} expired password resets", removed),
                        Err(e) => warn!("Password reset purge failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Password reset purge task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use eartrain_common::db::init_database;
    use eartrain_common::time::now;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_purge_task_removes_expired_and_stops() {
        let dir = TempDir::new().unwrap();
        let db = init_database(&dir.path().join("purge.db")).await.unwrap();

        let t = now();
        password_resets::create_reset(&db, "a@b.co", "expired", t - ChronoDuration::minutes(1), t)
            .await
            .unwrap();
        password_resets::create_reset(&db, "a@b.co", "live", t + ChronoDuration::hours(1), t)
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = spawn_purge_task(db.clone(), Duration::from_millis(20), rx);

        // first tick fires immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let remaining: Vec<String> =
            sqlx::query_scalar("SELECT token_hash FROM password_resets ORDER BY token_hash")
                .fetch_all(&db)
                .await
                .unwrap();
        assert_eq!(remaining, vec!["live".to_string()]);
    }
}
