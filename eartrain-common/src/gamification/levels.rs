//! XP to level formulas
//!
//! The level curve is `xp_for_level(L) = round(100 * L^1.5)`, with level 1
//! starting at 0 XP. Both the stored level and every displayed "XP to next
//! level" figure derive from this curve.

use serde::Serialize;

/// Highest level, reached at 100 billion XP
///
/// Far beyond what sessions can award, it only bounds the search for
/// corrupted or hostile XP values.
pub const MAX_LEVEL: i64 = 1_000_000;

/// Total XP required to reach `level`
///
/// Level 1 (and anything below) requires 0 XP.
///
/// # Examples
///
/// ```
/// use eartrain_common::gamification::xp_for_level;
///
/// assert_eq!(xp_for_level(1), 0);
/// assert_eq!(xp_for_level(2), 283);
/// assert_eq!(xp_for_level(4), 800);
/// ```
pub fn xp_for_level(level: i64) -> i64 {
    if level <= 1 {
        return 0;
    }
    (100.0 * (level as f64).powf(1.5)).round() as i64
}

/// Level reached with `xp` total experience
///
/// The highest level whose threshold `xp` covers. Starts from the inverse of
/// the curve, `(xp / 100)^(2/3)`, and steps to the exact answer, which is
/// at most a level or two away after float rounding.
pub fn level_from_xp(xp: i64) -> i64 {
    if xp <= 0 {
        return 1;
    }

    let mut level = ((xp as f64 / 100.0).powf(2.0 / 3.0).floor() as i64).clamp(1, MAX_LEVEL);
    while level > 1 && xp_for_level(level) > xp {
        level -= 1;
    }
    while level < MAX_LEVEL && xp_for_level(level + 1) <= xp {
        level += 1;
    }
    level
}

/// Level under the square-root formula `1 + floor(sqrt(xp / 100))`
///
/// This is not the curve used to assign levels; it disagrees with
/// [`level_from_xp`] (e.g. at 400 XP it yields 3 where the curve yields 2).
/// It is kept so older snapshots computed with it can be compared.
pub fn legacy_level_from_xp(xp: i64) -> i64 {
    if xp <= 0 {
        return 1;
    }
    1 + (xp as f64 / 100.0).sqrt().floor() as i64
}

/// Percentage of the way from `level` to `level + 1`, clamped to [0, 100]
pub fn level_progress(xp: i64, level: i64) -> f64 {
    let current = xp_for_level(level);
    let next = xp_for_level(level + 1);
    let span = next - current;
    if span <= 0 {
        return 100.0;
    }
    let pct = (xp - current) as f64 / span as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// XP still needed to reach the next level
pub fn xp_to_next_level(xp: i64) -> i64 {
    let level = level_from_xp(xp);
    (xp_for_level(level + 1) - xp).max(0)
}

/// Level snapshot for API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: i64,
    pub xp: i64,
    pub current_level_xp: i64,
    pub next_level_xp: i64,
    pub progress_percent: f64,
    pub xp_to_next: i64,
}

impl LevelInfo {
    pub fn from_xp(xp: i64) -> Self {
        let level = level_from_xp(xp);
        Self {
            level,
            xp,
            current_level_xp: xp_for_level(level),
            next_level_xp: xp_for_level(level + 1),
            progress_percent: level_progress(xp, level),
            xp_to_next: xp_to_next_level(xp),
        }
    }
}
