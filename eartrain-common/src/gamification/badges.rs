//! Badge catalog and unlock rules

use serde::Serialize;

use super::SessionSubmission;
use crate::models::Progress;

/// Condition that unlocks a badge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BadgeCriterion {
    /// Completed at least this many sessions
    Sessions(i64),
    /// Current streak reached this many days
    Streak(i64),
    /// Reached this level
    Level(i64),
    /// Accumulated this much XP
    TotalXp(i64),
    /// A session with every answer correct and at least this many questions
    PerfectSession { min_questions: i64 },
    /// Overall accuracy at or above `percent` over at least `min_questions`
    Accuracy { percent: f64, min_questions: i64 },
}

/// Unlockable achievement
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub criterion: BadgeCriterion,
}

/// Full badge catalog
pub static BADGES: &[Badge] = &[
    Badge {
        id: "first_session",
        name: "First Steps",
        description: "Complete your first exercise session",
        criterion: BadgeCriterion::Sessions(1),
    },
    Badge {
        id: "dedicated",
        name: "Dedicated",
        description: "Complete 10 exercise sessions",
        criterion: BadgeCriterion::Sessions(10),
    },
    Badge {
        id: "committed",
        name: "Committed",
        description: "Complete 50 exercise sessions",
        criterion: BadgeCriterion::Sessions(50),
    },
    Badge {
        id: "streak_3",
        name: "On a Roll",
        description: "Practice three days in a row",
        criterion: BadgeCriterion::Streak(3),
    },
    Badge {
        id: "streak_7",
        name: "Week Warrior",
        description: "Practice seven days in a row",
        criterion: BadgeCriterion::Streak(7),
    },
    Badge {
        id: "streak_30",
        name: "Unstoppable",
        description: "Practice thirty days in a row",
        criterion: BadgeCriterion::Streak(30),
    },
    Badge {
        id: "level_5",
        name: "Rising Ear",
        description: "Reach level 5",
        criterion: BadgeCriterion::Level(5),
    },
    Badge {
        id: "level_10",
        name: "Golden Ear",
        description: "Reach level 10",
        criterion: BadgeCriterion::Level(10),
    },
    Badge {
        id: "perfect_session",
        name: "Perfect Pitch",
        description: "Answer every question correctly in a session of at least 5 questions",
        criterion: BadgeCriterion::PerfectSession { min_questions: 5 },
    },
    Badge {
        id: "xp_1000",
        name: "Thousand Club",
        description: "Earn 1000 XP",
        criterion: BadgeCriterion::TotalXp(1000),
    },
    Badge {
        id: "sharp_ear",
        name: "Sharp Ear",
        description: "Keep 90% accuracy over at least 100 questions",
        criterion: BadgeCriterion::Accuracy { percent: 90.0, min_questions: 100 },
    },
];

/// Look up a badge by id
pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

impl BadgeCriterion {
    fn is_met(&self, progress: &Progress, session: Option<&SessionSubmission>) -> bool {
        match *self {
            BadgeCriterion::Sessions(n) => progress.total_sessions >= n,
            BadgeCriterion::Streak(n) => progress.current_streak >= n,
            BadgeCriterion::Level(n) => progress.current_level >= n,
            BadgeCriterion::TotalXp(n) => progress.total_xp >= n,
            BadgeCriterion::PerfectSession { min_questions } => session
                .map(|s| s.total >= min_questions && s.correct == s.total)
                .unwrap_or(false),
            BadgeCriterion::Accuracy { percent, min_questions } => {
                progress.total_questions >= min_questions && progress.accuracy >= percent
            }
        }
    }
}

/// Badges newly earned by `progress` (after `session`, if any)
///
/// Badges listed in `owned` are never returned again.
pub fn evaluate_badges(
    progress: &Progress,
    session: Option<&SessionSubmission>,
    owned: &[String],
) -> Vec<&'static Badge> {
    BADGES
        .iter()
        .filter(|badge| !owned.iter().any(|id| id == badge.id))
        .filter(|badge| badge.criterion.is_met(progress, session))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseType;
    use chrono::Utc;

    fn progress() -> Progress {
        Progress::new("user-1", Utc::now())
    }

    fn submission(correct: i64, total: i64) -> SessionSubmission {
        SessionSubmission {
            exercise_type: ExerciseType::Intervals,
            score: 80,
            correct,
            total,
            duration_secs: 120,
        }
    }

    fn ids(badges: &[&Badge]) -> Vec<&'static str> {
        badges.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_badge_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for badge in BADGES {
            assert!(seen.insert(badge.id), "duplicate badge id {}", badge.id);
        }
    }

    #[test]
    fn test_first_session_badge() {
        let mut p = progress();
        p.total_sessions = 1;
        let earned = evaluate_badges(&p, Some(&submission(3, 5)), &[]);
        assert_eq!(ids(&earned), vec!["first_session"]);
    }

    #[test]
    fn test_owned_badges_not_awarded_again() {
        let mut p = progress();
        p.total_sessions = 12;
        let owned = vec!["first_session".to_string()];
        let earned = evaluate_badges(&p, None, &owned);
        assert_eq!(ids(&earned), vec!["dedicated"]);
    }

    #[test]
    fn test_perfect_session_requires_minimum_questions() {
        let mut p = progress();
        p.total_sessions = 1;
        let owned = vec!["first_session".to_string()];
        assert!(evaluate_badges(&p, Some(&submission(4, 4)), &owned).is_empty());
        let earned = evaluate_badges(&p, Some(&submission(5, 5)), &owned);
        assert_eq!(ids(&earned), vec!["perfect_session"]);
    }

    #[test]
    fn test_accuracy_badge_needs_volume() {
        let mut p = progress();
        p.total_questions = 50;
        p.total_correct = 50;
        p.accuracy = 100.0;
        assert!(evaluate_badges(&p, None, &[]).iter().all(|b| b.id != "sharp_ear"));

        p.total_questions = 100;
        p.total_correct = 91;
        p.accuracy = 91.0;
        assert!(evaluate_badges(&p, None, &[]).iter().any(|b| b.id == "sharp_ear"));
    }

    #[test]
    fn test_streak_and_level_badges() {
        let mut p = progress();
        p.current_streak = 7;
        p.current_level = 5;
        p.total_xp = 1200;
        let earned = ids(&evaluate_badges(&p, None, &[]));
        assert!(earned.contains(&"streak_3"));
        assert!(earned.contains(&"streak_7"));
        assert!(!earned.contains(&"streak_30"));
        assert!(earned.contains(&"level_5"));
        assert!(earned.contains(&"xp_1000"));
    }

    #[test]
    fn test_find_badge() {
        assert_eq!(find_badge("streak_7").map(|b| b.name), Some("Week Warrior"));
        assert!(find_badge("nope").is_none());
    }
}
