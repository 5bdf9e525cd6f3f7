//! Leaderboard ranking queries

use chrono::{DateTime, NaiveDate, Utc};
use eartrain_common::gamification::effective_streak;
use eartrain_common::models::LeaderboardMetric;
use eartrain_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;

/// One ranked row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    #[sqlx(skip)]
    pub rank: i64,
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub level: i64,
    pub total_xp: i64,
    pub total_points: i64,
    pub accuracy: f64,
    pub total_sessions: i64,
    pub current_streak: i64,
    #[serde(skip)]
    pub last_activity_date: Option<NaiveDate>,
}

impl LeaderboardEntry {
    /// Value of the metric this entry was ranked by
    pub fn value(&self, metric: LeaderboardMetric) -> f64 {
        match metric {
            LeaderboardMetric::Xp => self.total_xp as f64,
            LeaderboardMetric::Points => self.total_points as f64,
            LeaderboardMetric::Accuracy => self.accuracy,
            LeaderboardMetric::Level => self.level as f64,
        }
    }
}

/// ORDER BY clause for a metric; ties fall back to XP then name
fn order_by(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::Xp => "p.total_xp DESC, u.name ASC, u.id ASC",
        LeaderboardMetric::Points => "p.total_points DESC, p.total_xp DESC, u.name ASC, u.id ASC",
        LeaderboardMetric::Accuracy => "p.accuracy DESC, p.total_xp DESC, u.name ASC, u.id ASC",
        LeaderboardMetric::Level => "p.current_level DESC, p.total_xp DESC, u.name ASC, u.id ASC",
    }
}

/// Top `limit` users by `metric`, ranked 1..N
///
/// Users who have not completed a session are not listed. Streaks are
/// reported as of `now`.
pub async fn top(
    pool: &SqlitePool,
    metric: LeaderboardMetric,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<LeaderboardEntry>> {
    let sql = format!(
        r#"
        SELECT u.id AS user_id, u.name, u.avatar,
               p.current_level AS level, p.total_xp, p.total_points, p.accuracy,
               p.total_sessions, p.current_streak, p.last_activity_date
        FROM progress p
        JOIN users u ON u.id = p.user_id
        WHERE p.total_sessions > 0
        ORDER BY {}
        LIMIT ?
        "#,
        order_by(metric)
    );

    let mut entries = sqlx::query_as::<_, LeaderboardEntry>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let today = time::day_of(now);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as i64 + 1;
        entry.current_streak =
            effective_streak(entry.last_activity_date, today, entry.current_streak);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_metric_has_ordering() {
        for metric in LeaderboardMetric::ALL {
            let clause = order_by(*metric);
            assert!(clause.contains("DESC"));
            assert!(clause.ends_with("u.id ASC"));
        }
    }
}
