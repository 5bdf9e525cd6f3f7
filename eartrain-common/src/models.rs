//! Domain models shared by the EarTrain crates
//!
//! Row-shaped structs derive `sqlx::FromRow` so the query modules can load
//! them directly. Enumerations are stored as lowercase TEXT.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Implements `Display`/`FromStr` over the lowercase wire names of a unit enum
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Lowercase name used on the wire and in the database
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

// ========================================
// Enumerations
// ========================================

/// Account subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Pro,
}

text_enum!(SubscriptionTier { Free => "free", Premium => "premium", Pro => "pro" });

/// Kind of ear-training exercise a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ExerciseType {
    Intervals,
    Chords,
    Progressions,
    Scales,
    Melodies,
    Rhythm,
}

text_enum!(ExerciseType {
    Intervals => "intervals",
    Chords => "chords",
    Progressions => "progressions",
    Scales => "scales",
    Melodies => "melodies",
    Rhythm => "rhythm",
});

/// Difficulty of a chord progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

text_enum!(Difficulty {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

/// Stylistic category of a chord progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Pop,
    Jazz,
    Classical,
    Blues,
    Rock,
    Folk,
}

text_enum!(Category {
    Pop => "pop",
    Jazz => "jazz",
    Classical => "classical",
    Blues => "blues",
    Rock => "rock",
    Folk => "folk",
});

/// Tonal mode a progression is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

text_enum!(Mode { Major => "major", Minor => "minor" });

/// Metric a leaderboard is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    #[default]
    Xp,
    Points,
    Accuracy,
    Level,
}

text_enum!(LeaderboardMetric {
    Xp => "xp",
    Points => "points",
    Accuracy => "accuracy",
    Level => "level",
});

// ========================================
// Users
// ========================================

/// Stored user account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub name: String,
    pub subscription: SubscriptionTier,
    pub level: i64,
    pub xp: i64,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}

impl User {
    /// Public projection, safe to serialize to clients
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            subscription: self.subscription,
            level: self.level,
            xp: self.xp,
            avatar: self.avatar.clone(),
            has_password: self.password_hash.is_some(),
            google_linked: self.google_id.is_some(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

/// User fields exposed over the API (never includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub subscription: SubscriptionTier,
    pub level: i64,
    pub xp: i64,
    pub avatar: Option<String>,
    pub has_password: bool,
    pub google_linked: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}

// ========================================
// Progress
// ========================================

/// Aggregated progress for one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Progress {
    pub user_id: String,
    pub total_xp: i64,
    pub current_level: i64,
    pub total_points: i64,
    pub total_sessions: i64,
    pub total_correct: i64,
    pub total_questions: i64,
    pub accuracy: f64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Fresh progress record for a new user
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            current_level: 1,
            total_points: 0,
            total_sessions: 0,
            total_correct: 0,
            total_questions: 0,
            accuracy: 0.0,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-exercise-type statistics
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExerciseStat {
    pub exercise_type: ExerciseType,
    pub sessions: i64,
    pub correct: i64,
    pub total: i64,
    pub best_score: i64,
    pub xp_earned: i64,
    pub last_played_at: DateTime<Utc>,
}

/// One completed exercise session in the recent history
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub exercise_type: ExerciseType,
    pub score: i64,
    pub correct: i64,
    pub total: i64,
    pub xp_earned: i64,
    pub duration_secs: i64,
    pub completed_at: DateTime<Utc>,
}

/// Badge unlocked by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserBadge {
    pub badge_id: String,
    pub unlocked_at: DateTime<Utc>,
}

// ========================================
// Password reset
// ========================================

/// Stored password reset request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: i64,
    pub email: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Token can still be redeemed at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

// ========================================
// Chord progressions
// ========================================

/// Chord progression catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChordProgression {
    pub id: String,
    pub name: String,
    #[sqlx(json)]
    pub degrees: Vec<String>,
    pub difficulty: Difficulty,
    pub category: Category,
    pub mode: Mode,
    pub tempo: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_through_text() {
        for ty in ExerciseType::ALL {
            assert_eq!(ty.as_str().parse::<ExerciseType>().unwrap(), *ty);
        }
        assert_eq!("  JAZZ ".parse::<Category>().unwrap(), Category::Jazz);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let err = "expert".parse::<Difficulty>().unwrap_err();
        assert!(err.to_string().contains("expert"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&SubscriptionTier::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
        let metric: LeaderboardMetric = serde_json::from_str("\"accuracy\"").unwrap();
        assert_eq!(metric, LeaderboardMetric::Accuracy);
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            google_id: None,
            name: "Ada".to_string(),
            subscription: SubscriptionTier::Free,
            level: 1,
            xp: 0,
            avatar: None,
            created_at: now,
            updated_at: now,
            last_active: None,
        };
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"has_password\":true"));
        assert!(json.contains("\"google_linked\":false"));
    }

    #[test]
    fn test_reset_usability() {
        let now = Utc::now();
        let mut reset = PasswordReset {
            id: 1,
            email: "a@example.com".to_string(),
            token_hash: "abc".to_string(),
            expires_at: now + chrono::Duration::minutes(5),
            used: false,
            created_at: now,
        };
        assert!(reset.is_usable(now));
        assert!(!reset.is_usable(now + chrono::Duration::minutes(6)));
        reset.used = true;
        assert!(!reset.is_usable(now));
    }
}
