//! Daily activity streaks (UTC calendar days)

use chrono::NaiveDate;

use crate::time::days_between;

/// Result of counting one day of activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current: i64,
    pub longest: i64,
    /// Streak grew (or started) with this activity
    pub extended: bool,
}

/// Count activity on `today` against the previous state
///
/// - same day as the last activity: unchanged
/// - the day after: streak + 1
/// - any other gap, or no previous activity: restart at 1
pub fn advance_streak(
    last_activity: Option<NaiveDate>,
    today: NaiveDate,
    current: i64,
    longest: i64,
) -> StreakUpdate {
    let (next, extended) = match last_activity.map(|last| days_between(last, today)) {
        Some(0) => (current.max(1), false),
        Some(1) => (current + 1, true),
        _ => (1, true),
    };

    StreakUpdate {
        current: next,
        longest: longest.max(next),
        extended,
    }
}

/// Streak as of `today`, for display
///
/// The stored streak only changes when a session is recorded, so a user who
/// stopped practising still carries their old count. Once a full day has
/// been missed the streak is broken and reads as 0.
pub fn effective_streak(last_activity: Option<NaiveDate>, today: NaiveDate, current: i64) -> i64 {
    match last_activity.map(|last| days_between(last, today)) {
        Some(0 | 1) => current,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let s = advance_streak(None, day(1), 0, 0);
        assert_eq!(s, StreakUpdate { current: 1, longest: 1, extended: true });
    }

    #[test]
    fn test_same_day_is_unchanged() {
        let s = advance_streak(Some(day(3)), day(3), 4, 6);
        assert_eq!(s.current, 4);
        assert_eq!(s.longest, 6);
        assert!(!s.extended);
    }

    #[test]
    fn test_next_day_extends() {
        let s = advance_streak(Some(day(3)), day(4), 4, 4);
        assert_eq!(s.current, 5);
        assert_eq!(s.longest, 5);
        assert!(s.extended);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let s = advance_streak(Some(day(1)), day(5), 9, 12);
        assert_eq!(s.current, 1);
        assert_eq!(s.longest, 12);
    }

    #[test]
    fn test_clock_going_backwards_resets() {
        let s = advance_streak(Some(day(10)), day(9), 3, 3);
        assert_eq!(s.current, 1);
    }

    #[test]
    fn test_effective_streak_survives_until_a_day_is_missed() {
        assert_eq!(effective_streak(Some(day(3)), day(3), 4), 4);
        assert_eq!(effective_streak(Some(day(3)), day(4), 4), 4);
        assert_eq!(effective_streak(Some(day(3)), day(5), 4), 0);
        assert_eq!(effective_streak(None, day(5), 0), 0);
    }
}
