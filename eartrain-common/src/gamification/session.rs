//! Applying a completed exercise session to a user's progress

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::levels::level_from_xp;
use super::streak::advance_streak;
use super::accuracy_percent;
use crate::models::{ExerciseType, Progress};
use crate::time::day_of;
use crate::validation::{in_range, ValidationError};

/// XP awarded per correct answer
pub const XP_PER_CORRECT: i64 = 10;
/// Bonus for answering every question in a session correctly
pub const PERFECT_SESSION_BONUS: i64 = 25;
/// Bonus per streak day
pub const STREAK_BONUS_PER_DAY: i64 = 5;
/// Streak days beyond this earn no extra bonus
pub const STREAK_BONUS_CAP: i64 = 10;

pub const MAX_QUESTIONS_PER_SESSION: i64 = 500;
pub const MAX_SESSION_SECS: i64 = 4 * 60 * 60;

/// A validated session submission
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSubmission {
    pub exercise_type: ExerciseType,
    /// Client-reported score, 0-100
    pub score: i64,
    pub correct: i64,
    pub total: i64,
    pub duration_secs: i64,
}

impl SessionSubmission {
    pub fn new(
        exercise_type: ExerciseType,
        score: i64,
        correct: i64,
        total: i64,
        duration_secs: i64,
    ) -> Result<Self, ValidationError> {
        let total = in_range("total", total, 0, MAX_QUESTIONS_PER_SESSION)?;
        let correct = in_range("correct", correct, 0, total)?;
        let score = in_range("score", score, 0, 100)?;
        let duration_secs = in_range("duration_secs", duration_secs, 0, MAX_SESSION_SECS)?;

        Ok(Self {
            exercise_type,
            score,
            correct,
            total,
            duration_secs,
        })
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}

/// XP earned for a session given the streak after it was counted
pub fn session_xp(correct: i64, total: i64, streak: i64) -> i64 {
    let base = correct.max(0) * XP_PER_CORRECT;
    let perfect = if total > 0 && correct == total {
        PERFECT_SESSION_BONUS
    } else {
        0
    };
    let streak_bonus = streak.clamp(0, STREAK_BONUS_CAP) * STREAK_BONUS_PER_DAY;
    base + perfect + streak_bonus
}

/// What a session changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub xp_earned: i64,
    pub points_earned: i64,
    pub total_xp: i64,
    pub level_before: i64,
    pub level_after: i64,
    pub leveled_up: bool,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub accuracy: f64,
}

/// Fold a session into `progress`
///
/// Updates the streak first so the streak bonus reflects today's activity,
/// then XP, points, answer totals, accuracy and the derived level.
pub fn apply_session(
    progress: &mut Progress,
    submission: &SessionSubmission,
    now: DateTime<Utc>,
) -> SessionOutcome {
    let today = day_of(now);
    let level_before = progress.current_level;

    let streak = advance_streak(
        progress.last_activity_date,
        today,
        progress.current_streak,
        progress.longest_streak,
    );
    progress.current_streak = streak.current;
    progress.longest_streak = streak.longest;
    progress.last_activity_date = Some(today);

    let xp_earned = session_xp(submission.correct, submission.total, streak.current);
    progress.total_xp += xp_earned;
    progress.total_points += submission.score;
    progress.total_sessions += 1;
    progress.total_correct += submission.correct;
    progress.total_questions += submission.total;
    progress.accuracy = accuracy_percent(progress.total_correct, progress.total_questions);
    progress.current_level = level_from_xp(progress.total_xp);
    progress.updated_at = now;

    SessionOutcome {
        xp_earned,
        points_earned: submission.score,
        total_xp: progress.total_xp,
        level_before,
        level_after: progress.current_level,
        leveled_up: progress.current_level > level_before,
        current_streak: progress.current_streak,
        longest_streak: progress.longest_streak,
        accuracy: progress.accuracy,
    }
}
