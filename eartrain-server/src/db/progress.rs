//! Progress, per-exercise statistics, session history and badges

use chrono::{DateTime, Utc};
use eartrain_common::gamification::{
    apply_session, effective_streak, evaluate_badges, Badge, SessionOutcome, SessionSubmission,
};
use eartrain_common::models::{ExerciseStat, Progress, SessionRecord, UserBadge};
use eartrain_common::{time, uuid_utils, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

/// Sessions kept per user; older ones are dropped
pub const HISTORY_LIMIT: i64 = 50;

/// Create the user's progress row if it does not exist yet
///
/// Safe under concurrent first requests: the primary key turns a racing
/// insert into a no-op.
pub async fn ensure_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO progress (user_id, created_at, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

async fn fetch_progress(conn: &mut SqliteConnection, user_id: &str) -> Result<Progress> {
    let progress = sqlx::query_as::<_, Progress>(
        r#"
        SELECT user_id, total_xp, current_level, total_points, total_sessions,
               total_correct, total_questions, accuracy, current_streak,
               longest_streak, last_activity_date, created_at, updated_at
        FROM progress WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(progress)
}

/// Progress for `user_id`, creating an empty record on first access
///
/// The current streak is reported as of `now`, so a lapsed streak reads 0.
pub async fn load_progress(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Progress> {
    let mut conn = pool.acquire().await?;
    ensure_progress(&mut conn, user_id, now).await?;
    let mut progress = fetch_progress(&mut conn, user_id).await?;
    progress.current_streak = effective_streak(
        progress.last_activity_date,
        time::day_of(now),
        progress.current_streak,
    );
    Ok(progress)
}

pub async fn exercise_stats(pool: &SqlitePool, user_id: &str) -> Result<Vec<ExerciseStat>> {
    let stats = sqlx::query_as::<_, ExerciseStat>(
        r#"
        SELECT exercise_type, sessions, correct, total, best_score, xp_earned, last_played_at
        FROM exercise_stats WHERE user_id = ?
        ORDER BY exercise_type
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(stats)
}

/// Session history, newest first
pub async fn recent_sessions(pool: &SqlitePool, user_id: &str) -> Result<Vec<SessionRecord>> {
    let sessions = sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT id, exercise_type, score, correct, total, xp_earned, duration_secs, completed_at
        FROM session_history WHERE user_id = ?
        ORDER BY completed_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}

/// Badges unlocked by the user, oldest first
pub async fn user_badges(pool: &SqlitePool, user_id: &str) -> Result<Vec<UserBadge>> {
    let badges = sqlx::query_as::<_, UserBadge>(
        "SELECT badge_id, unlocked_at FROM user_badges \
         WHERE user_id = ? ORDER BY unlocked_at, badge_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(badges)
}

/// Result of [`record_session`]
#[derive(Debug, Clone)]
pub struct RecordedSession {
    pub session_id: String,
    pub outcome: SessionOutcome,
    pub new_badges: Vec<&'static Badge>,
}

/// Apply a completed session to the user's progress
///
/// Runs in one transaction. The first statement writes, so concurrent
/// submissions for the same user serialize on SQLite's write lock.
pub async fn record_session(
    pool: &SqlitePool,
    user_id: &str,
    submission: &SessionSubmission,
    now: DateTime<Utc>,
) -> Result<RecordedSession> {
    let mut tx = pool.begin().await?;

    ensure_progress(&mut tx, user_id, now).await?;
    let mut progress = fetch_progress(&mut tx, user_id).await?;
    let outcome = apply_session(&mut progress, submission, now);

    sqlx::query(
        r#"
        UPDATE progress SET
            total_xp = ?, current_level = ?, total_points = ?, total_sessions = ?,
            total_correct = ?, total_questions = ?, accuracy = ?,
            current_streak = ?, longest_streak = ?, last_activity_date = ?,
            updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(progress.total_xp)
    .bind(progress.current_level)
    .bind(progress.total_points)
    .bind(progress.total_sessions)
    .bind(progress.total_correct)
    .bind(progress.total_questions)
    .bind(progress.accuracy)
    .bind(progress.current_streak)
    .bind(progress.longest_streak)
    .bind(progress.last_activity_date)
    .bind(progress.updated_at)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO exercise_stats
            (user_id, exercise_type, sessions, correct, total, best_score, xp_earned, last_played_at)
        VALUES (?, ?, 1, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, exercise_type) DO UPDATE SET
            sessions = sessions + 1,
            correct = correct + excluded.correct,
            total = total + excluded.total,
            best_score = MAX(best_score, excluded.best_score),
            xp_earned = xp_earned + excluded.xp_earned,
            last_played_at = excluded.last_played_at
        "#,
    )
    .bind(user_id)
    .bind(submission.exercise_type)
    .bind(submission.correct)
    .bind(submission.total)
    .bind(submission.score)
    .bind(outcome.xp_earned)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let session_id = uuid_utils::new_id();
    sqlx::query(
        r#"
        INSERT INTO session_history
            (id, user_id, exercise_type, score, correct, total, xp_earned, duration_secs, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(submission.exercise_type)
    .bind(submission.score)
    .bind(submission.correct)
    .bind(submission.total)
    .bind(outcome.xp_earned)
    .bind(submission.duration_secs)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let trimmed = sqlx::query(
        r#"
        DELETE FROM session_history
        WHERE user_id = ?
          AND id NOT IN (
              SELECT id FROM session_history
              WHERE user_id = ?
              ORDER BY completed_at DESC, rowid DESC
              LIMIT ?
          )
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(HISTORY_LIMIT)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let owned: Vec<String> =
        sqlx::query_scalar("SELECT badge_id FROM user_badges WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

    let new_badges = evaluate_badges(&progress, Some(submission), &owned);
    for badge in &new_badges {
        sqlx::query(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, unlocked_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(badge.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    super::users::update_level_snapshot(
        &mut tx,
        user_id,
        progress.current_level,
        progress.total_xp,
        now,
    )
    .await?;

    tx.commit().await?;

    debug!(
        "Recorded session {} for user {}: +{} xp, {} new badges, {} history rows trimmed",
        session_id,
        user_id,
        outcome.xp_earned,
        new_badges.len(),
        trimmed
    );

    Ok(RecordedSession {
        session_id,
        outcome,
        new_badges,
    })
}
