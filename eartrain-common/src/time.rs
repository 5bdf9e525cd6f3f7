//! Timestamp utilities

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar day (UTC) of a timestamp, used for streak bookkeeping
pub fn day_of(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// Whole calendar days from `earlier` to `later` (negative if reversed)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Timestamp `minutes` after `from`
pub fn minutes_after(from: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    from + Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_day_of_uses_utc_date() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(day_of(ts), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_days_between_across_month_boundary() {
        let a = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        // 2024 is a leap year
        assert_eq!(days_between(a, b), 2);
        assert_eq!(days_between(b, a), -2);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn test_minutes_after() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let later = minutes_after(start, 60);
        assert_eq!(later, Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap());
    }
}
