//! Gamification: XP, levels, streaks, badges and session scoring
//!
//! Everything in this module is a pure function over plain records. The
//! server's query layer loads a [`Progress`](crate::models::Progress),
//! applies a session here, and persists the result in one transaction.

pub mod badges;
pub mod levels;
pub mod session;
pub mod streak;

pub use badges::{evaluate_badges, find_badge, Badge, BadgeCriterion, BADGES};
pub use levels::{
    legacy_level_from_xp, level_from_xp, level_progress, xp_for_level, xp_to_next_level,
    LevelInfo,
};
pub use session::{apply_session, session_xp, SessionOutcome, SessionSubmission};
pub use streak::{advance_streak, effective_streak, StreakUpdate};

/// Accuracy percentage, 0 when nothing has been answered yet
pub fn accuracy_percent(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = correct as f64 / total as f64 * 100.0;
    // Two decimal places is plenty for display and ranking
    (pct * 100.0).round() / 100.0
}
