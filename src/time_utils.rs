// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and leaderboard windows.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};

use crate::models::DateWindow;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Current week so far: Monday through `today`.
pub fn week_to_date(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: start_of_week(today),
        end: today,
    }
}

/// Current month so far: the 1st through `today`.
pub fn month_to_date(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: start_of_month(today),
        end: today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_start_of_week_is_monday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(start_of_week(d(2024, 1, 10)), d(2024, 1, 8));
        assert_eq!(start_of_week(d(2024, 1, 8)), d(2024, 1, 8));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(start_of_week(d(2024, 1, 14)), d(2024, 1, 8));
    }

    #[test]
    fn test_week_crossing_month_boundary() {
        // 2024-03-01 is a Friday
        assert_eq!(start_of_week(d(2024, 3, 1)), d(2024, 2, 26));
    }

    #[test]
    fn test_month_to_date() {
        let window = month_to_date(d(2024, 1, 17));
        assert_eq!(window.start, d(2024, 1, 1));
        assert_eq!(window.end, d(2024, 1, 17));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-10"), Some(d(2024, 1, 10)));
        assert_eq!(parse_date("2024-13-10"), None);
        assert_eq!(parse_date("10.01.2024"), None);
    }
}
